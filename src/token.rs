use crate::copy_token::CopyToken;
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::CHUNK_SIZE;

/// One decoded unit of a TokenSequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Copy(CopyToken),
}

impl Token {
    /// Number of bytes this token produces.
    pub fn output_len(&self) -> usize {
        match self {
            Token::Literal(_) => 1,
            Token::Copy(copy) => copy.length,
        }
    }

    /// Append this token's bytes to `output`, which holds only the current chunk.
    pub fn append_to(&self, output: &mut Vec<u8>) -> Result<()> {
        match self {
            Token::Literal(b) => {
                output.push(*b);
                Ok(())
            }
            Token::Copy(copy) => copy.expand(output),
        }
    }
}

/// Decode state for a single compressed chunk.
///
/// `difference`, the count of bytes written since the chunk start, is simply the length of the
/// chunk's own output buffer.
#[derive(Clone, Debug)]
pub struct DecodeContext {
    chunk: usize,
    output: Vec<u8>,
}

impl DecodeContext {
    pub fn new(chunk: usize) -> Self {
        Self {
            chunk,
            output: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    pub fn chunk(&self) -> usize {
        self.chunk
    }

    pub fn difference(&self) -> usize {
        self.output.len()
    }

    pub fn is_full(&self) -> bool {
        self.output.len() >= CHUNK_SIZE
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    fn push(&mut self, token: &Token) -> Result<()> {
        let actual = self.output.len() + token.output_len();
        if actual > CHUNK_SIZE {
            return Err(Error::ChunkOverflow {
                chunk: self.chunk,
                actual,
            });
        }
        token.append_to(&mut self.output)
    }
}

/// A flag byte followed by up to 8 tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSequence {
    flag_byte: u8,
    count: usize,
    tokens: [Token; 8],
}

impl TokenSequence {
    /// Decode one sequence from `cursor`, writing its output into `ctx` as each token is read.
    ///
    /// Stops early once the cursor runs dry or the chunk is full, which is only valid for the
    /// last sequence of a chunk.
    pub fn decode(cursor: &mut ByteCursor, ctx: &mut DecodeContext) -> Result<Self> {
        let flag_byte = cursor.read_u8("decode TokenSequence flag byte")?;
        let mut seq = TokenSequence {
            flag_byte,
            count: 0,
            tokens: [Token::Literal(0); 8],
        };
        for i in 0..8 {
            if cursor.is_at_end() || ctx.is_full() {
                break;
            }
            let token = if (flag_byte >> i) & 1 == 0 {
                Token::Literal(cursor.read_u8("decode LiteralToken")?)
            } else {
                let raw = cursor.read_u16("decode CopyToken")?;
                Token::Copy(CopyToken::unpack(raw, ctx.difference())?)
            };
            ctx.push(&token)?;
            seq.tokens[i] = token;
            seq.count += 1;
        }
        Ok(seq)
    }

    pub fn flag_byte(&self) -> u8 {
        self.flag_byte
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens[..self.count]
    }

    /// True if this sequence holds fewer than 8 tokens.
    pub fn is_short(&self) -> bool {
        self.count < 8
    }

    /// Total bytes produced by this sequence.
    pub fn output_len(&self) -> usize {
        self.tokens().iter().map(Token::output_len).sum()
    }
}
