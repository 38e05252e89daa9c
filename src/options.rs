use serde::{Deserialize, Serialize};

use crate::MAX_DECOMPRESSED_SIZE;

/// What to do with a final uncompressed chunk whose body is shorter than 4096 bytes.
///
/// A short uncompressed chunk anywhere but the end of a container is always rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortChunkPolicy {
    /// Fail with [`Error::BadChunkLength`][crate::Error::BadChunkLength].
    #[default]
    Reject,
    /// Keep the short body as-is.
    Accept,
    /// Pad the body with zeroes up to 4096 bytes.
    ZeroPad,
}

/// Settings for [`decompress_with`][crate::decompress_with] and
/// [`decompress_all`][crate::decompress_all].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecompressOptions {
    pub short_final_chunk: ShortChunkPolicy,
    /// Maximum total decompressed size, in bytes.
    pub max_size: usize,
    /// Containers with at least this many chunks decode them on the rayon thread pool. Zero
    /// keeps decoding on the calling thread.
    pub parallel_threshold: usize,
}

impl DecompressOptions {
    pub fn short_final_chunk(mut self, policy: ShortChunkPolicy) -> Self {
        self.short_final_chunk = policy;
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub(crate) fn use_parallel(&self, chunks: usize) -> bool {
        self.parallel_threshold != 0 && chunks >= self.parallel_threshold
    }
}

impl std::default::Default for DecompressOptions {
    fn default() -> Self {
        Self {
            short_final_chunk: ShortChunkPolicy::Reject,
            max_size: MAX_DECOMPRESSED_SIZE,
            parallel_threshold: 16,
        }
    }
}
