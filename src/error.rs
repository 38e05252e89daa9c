use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Decoding failures.
///
/// Input is untrusted and static, so none of these are worth retrying. Every variant except
/// [`Error::LengthTooLong`] means the data is corrupted; see [`Error::is_corrupted`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The container's leading signature byte was not 0x01.
    BadSignature(u8),
    /// A chunk header's signature bits were not 0b011.
    BadChunkSignature { chunk: usize, signature: u8 },
    /// Input ended before a required field could be read.
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// An uncompressed chunk body wasn't exactly 4096 bytes.
    BadChunkLength { chunk: usize, actual: usize },
    /// A CopyToken unpacked to a length larger than the current window allows.
    BadCopyLength { token: u16, length: usize, max: usize },
    /// A CopyToken pointed outside the bytes already written in its chunk.
    BadCopyOffset { offset: usize, written: usize },
    /// A chunk decompressed to more than 4096 bytes.
    ChunkOverflow { chunk: usize, actual: usize },
    /// A record's id or size field didn't hold its required value.
    BadRecord {
        step: &'static str,
        expected: u32,
        actual: u32,
    },
    /// A record string couldn't be decoded in its declared encoding.
    BadText(String),
    /// Decompressed output was greater than the configured maximum size.
    LengthTooLong { max: usize, actual: usize },
}

impl Error {
    /// True for every failure caused by malformed input, as opposed to a configured limit.
    pub fn is_corrupted(&self) -> bool {
        !matches!(self, Error::LengthTooLong { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::BadSignature(sig) => write!(
                f,
                "Container signature byte was 0x{:02x}, expected 0x01",
                sig
            ),
            Error::BadChunkSignature { chunk, signature } => write!(
                f,
                "Chunk {} has signature 0b{:03b}, expected 0b011",
                chunk, signature
            ),
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected data length {}, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::BadChunkLength { chunk, actual } => write!(
                f,
                "Uncompressed chunk {} holds {} bytes, expected 4096",
                chunk, actual
            ),
            Error::BadCopyLength { token, length, max } => write!(
                f,
                "CopyToken 0x{:04x} has length {}, window maximum is {}",
                token, length, max
            ),
            Error::BadCopyOffset { offset, written } => write!(
                f,
                "CopyToken offset {} reaches before chunk start ({} bytes written)",
                offset, written
            ),
            Error::ChunkOverflow { chunk, actual } => write!(
                f,
                "Chunk {} decompressed to {} bytes, maximum is 4096",
                chunk, actual
            ),
            Error::BadRecord {
                step,
                expected,
                actual,
            } => write!(
                f,
                "Expected 0x{:x} but got 0x{:x} on step [{}]",
                expected, actual, step
            ),
            Error::BadText(ref err) => write!(f, "Undecodable record text: {}", err),
            Error::LengthTooLong { max, actual } => write!(
                f,
                "Data too long: was {} bytes, maximum allowed is {}",
                actual, max
            ),
        }
    }
}

impl std::error::Error for Error {}
