use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::cursor::ByteCursor;

/// The decompressed contents of a container: every chunk's output, concatenated in order.
///
/// Immutable once built. Derefs to `[u8]`, and [`cursor`][Self::cursor] gives a seekable reader
/// for record parsers working over the result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDecompressedBuffer")]
pub struct DecompressedBuffer {
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
    /// End offset of each chunk's output within `data`. Non-decreasing, and the last one is
    /// `data.len()`.
    chunk_ends: Vec<usize>,
}

/// Deserialized form of [`DecompressedBuffer`], before its chunk boundaries are checked.
#[derive(Deserialize)]
struct RawDecompressedBuffer {
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
    chunk_ends: Vec<usize>,
}

impl TryFrom<RawDecompressedBuffer> for DecompressedBuffer {
    type Error = String;

    fn try_from(raw: RawDecompressedBuffer) -> Result<Self, Self::Error> {
        if raw.chunk_ends.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err("chunk ends are not in order".to_string());
        }
        let end = raw.chunk_ends.last().copied().unwrap_or(0);
        if end != raw.data.len() {
            return Err(format!(
                "last chunk ends at {}, but data holds {} bytes",
                end,
                raw.data.len()
            ));
        }
        Ok(Self {
            data: raw.data,
            chunk_ends: raw.chunk_ends,
        })
    }
}

impl DecompressedBuffer {
    /// Concatenate chunk outputs, in container order.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut buf = Self::default();
        for chunk in chunks {
            buf.push_chunk(&chunk);
        }
        buf
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            chunk_ends: Vec::new(),
        }
    }

    pub(crate) fn push_chunk(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
        self.chunk_ends.push(self.data.len());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// A reader starting at offset 0.
    pub fn cursor(&self) -> ByteCursor<'_> {
        ByteCursor::new(&self.data)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_ends.len()
    }

    /// The bytes that chunk `index` decompressed to.
    pub fn chunk(&self, index: usize) -> Option<&[u8]> {
        let end = *self.chunk_ends.get(index)?;
        let start = match index {
            0 => 0,
            _ => self.chunk_ends[index - 1],
        };
        self.data.get(start..end)
    }
}

impl Deref for DecompressedBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl AsRef<[u8]> for DecompressedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<DecompressedBuffer> for Vec<u8> {
    fn from(buf: DecompressedBuffer) -> Self {
        buf.data
    }
}
