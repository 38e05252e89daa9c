//! Decoder for the compressed containers found in VBA projects ([MS-OVBA] section 2.4.1).
//!
//! VBA projects stored in Office documents keep their `dir` stream and the source of every
//! module in a custom LZ77-style compression format. A `CompressedContainer` is a signature byte
//! followed by chunks, each of which decompresses to at most 4096 bytes:
//!
//! - A chunk is either 4096 raw bytes, or a run of TokenSequences.
//! - A TokenSequence is a flag byte and up to 8 tokens; each flag bit picks between a literal
//!   byte and a 2-byte CopyToken.
//! - A CopyToken is a back-reference into the chunk's output so far. How its 16 bits split
//!   between offset and length depends on how far into the chunk it appears.
//!
//! All input is treated as untrusted. Any inconsistency aborts the whole decode with an
//! [`Error`]; no partial output is ever returned.
//!
//! ```
//! // One compressed chunk holding the single literal 'A'
//! let data = [0x01, 0x01, 0xB0, 0x00, b'A'];
//! let out = ovba_decompress::decompress(&data).unwrap();
//! assert_eq!(out, b"A");
//! ```
//!
//! Chunks never reference each other, so containers with many chunks decode them on the rayon
//! thread pool (see [`DecompressOptions`]). [`decompress_all`] decodes many independent
//! containers, such as all the module streams of a project, in parallel.

use rayon::prelude::*;

mod buffer;
mod chunk;
mod container;
mod copy_token;
mod cursor;
mod error;
mod module;
mod options;
mod token;

pub use buffer::DecompressedBuffer;
pub use chunk::{ChunkHeader, CompressedChunk, CHUNK_SIGNATURE};
pub use container::{ChunkParser, CompressedContainer, CONTAINER_SIGNATURE};
pub use copy_token::{CopyToken, CopyTokenHelp};
pub use cursor::ByteCursor;
pub use error::{Error, Result};
pub use module::{is_srp_stream_name, ModuleDocString, ModuleOffset, ModuleStream};
pub use options::{DecompressOptions, ShortChunkPolicy};
pub use token::{DecodeContext, Token, TokenSequence};

/// Decompressed size of every full chunk.
pub const CHUNK_SIZE: usize = 4096;

/// Default cap on the total decompressed size of one container: 64 MiB.
pub const MAX_DECOMPRESSED_SIZE: usize = 1usize << 26;

/// Decompress a container with the default options.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_with(data, &DecompressOptions::default()).map(DecompressedBuffer::into_vec)
}

/// Decompress a container.
pub fn decompress_with(data: &[u8], options: &DecompressOptions) -> Result<DecompressedBuffer> {
    CompressedContainer::parse(data)?.decompress(options)
}

/// Decompress many independent containers in parallel. Results are in input order.
pub fn decompress_all<T>(
    containers: &[T],
    options: &DecompressOptions,
) -> Vec<Result<DecompressedBuffer>>
where
    T: AsRef<[u8]> + Sync,
{
    containers
        .par_iter()
        .map(|data| decompress_with(data.as_ref(), options))
        .collect()
}
