use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::options::ShortChunkPolicy;
use crate::token::{DecodeContext, TokenSequence};
use crate::CHUNK_SIZE;

/// Required value of the 3 signature bits in every chunk header.
pub const CHUNK_SIGNATURE: u8 = 0b011;

/// The 2-byte little-endian header starting each CompressedChunk.
///
/// Bits 0..12 hold the chunk size minus 3, bits 12..15 the signature, and bit 15 the
/// compressed flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub size: u16,
    pub signature: u8,
    pub compressed: bool,
}

impl ChunkHeader {
    pub fn from_u16(raw: u16) -> Self {
        Self {
            size: raw & 0x0FFF,
            signature: ((raw >> 12) & 0x7) as u8,
            compressed: (raw >> 15) & 0x1 == 1,
        }
    }

    pub fn to_u16(&self) -> u16 {
        (self.size & 0x0FFF)
            | ((self.signature as u16 & 0x7) << 12)
            | ((self.compressed as u16) << 15)
    }

    /// Header for a chunk whose body is `body_len` bytes long.
    pub fn for_body(body_len: usize, compressed: bool) -> Option<Self> {
        if body_len == 0 || body_len > CHUNK_SIZE {
            return None;
        }
        Some(Self {
            size: (body_len - 1) as u16,
            signature: CHUNK_SIGNATURE,
            compressed,
        })
    }

    /// Read and validate a header. `chunk` is the chunk's index, used for error reporting.
    pub fn read(cursor: &mut ByteCursor, chunk: usize) -> Result<Self> {
        let header = Self::from_u16(cursor.read_u16("decode chunk header")?);
        if header.signature != CHUNK_SIGNATURE {
            return Err(Error::BadChunkSignature {
                chunk,
                signature: header.signature,
            });
        }
        Ok(header)
    }

    /// Bytes following the header.
    pub fn body_len(&self) -> usize {
        self.size as usize + 1
    }

    /// Total compressed length of the chunk, header included.
    pub fn span_len(&self) -> usize {
        self.size as usize + 3
    }
}

/// One chunk of a container: its header and the exact byte span of its body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedChunk<'a> {
    index: usize,
    header: ChunkHeader,
    body: &'a [u8],
    is_final: bool,
}

impl<'a> CompressedChunk<'a> {
    /// Read one chunk from `cursor`, consuming exactly the span its header declares.
    pub fn read(cursor: &mut ByteCursor<'a>, index: usize) -> Result<Self> {
        let header = ChunkHeader::read(cursor, index)?;
        let body = cursor.read_bytes(header.body_len(), "read chunk body")?;
        Ok(Self {
            index,
            header,
            body,
            is_final: cursor.is_at_end(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn header(&self) -> ChunkHeader {
        self.header
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Whether this chunk ends the container.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn span_len(&self) -> usize {
        self.header.span_len()
    }

    /// Decompress this chunk on its own. Back-references never reach outside a chunk, so this
    /// depends only on the chunk's own bytes.
    pub fn decode(&self, policy: ShortChunkPolicy) -> Result<Vec<u8>> {
        log::trace!(
            "chunk {}: {} body bytes, compressed = {}",
            self.index,
            self.body.len(),
            self.header.compressed
        );
        if self.header.compressed {
            self.decode_compressed()
        } else {
            self.decode_raw(policy)
        }
    }

    fn decode_compressed(&self) -> Result<Vec<u8>> {
        let mut cursor = ByteCursor::new(self.body);
        let mut ctx = DecodeContext::new(self.index);
        while !cursor.is_at_end() && !ctx.is_full() {
            TokenSequence::decode(&mut cursor, &mut ctx)?;
        }
        if !cursor.is_at_end() {
            log::trace!(
                "chunk {}: ignoring {} bytes after a full chunk",
                self.index,
                cursor.remaining()
            );
        }
        Ok(ctx.into_output())
    }

    fn decode_raw(&self, policy: ShortChunkPolicy) -> Result<Vec<u8>> {
        let actual = self.body.len();
        if actual == CHUNK_SIZE {
            return Ok(self.body.to_vec());
        }
        let bad_length = Error::BadChunkLength {
            chunk: self.index,
            actual,
        };
        if !self.is_final {
            return Err(bad_length);
        }
        match policy {
            ShortChunkPolicy::Reject => Err(bad_length),
            ShortChunkPolicy::Accept => {
                log::warn!(
                    "accepting short uncompressed final chunk {} ({} bytes)",
                    self.index,
                    actual
                );
                Ok(self.body.to_vec())
            }
            ShortChunkPolicy::ZeroPad => {
                log::warn!(
                    "zero-padding short uncompressed final chunk {} ({} bytes)",
                    self.index,
                    actual
                );
                let mut out = self.body.to_vec();
                out.resize(CHUNK_SIZE, 0);
                Ok(out)
            }
        }
    }
}
