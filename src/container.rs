//! The CompressedContainer: a signature byte followed by CompressedChunks up to the end of the
//! input.

use rayon::prelude::*;

use crate::buffer::DecompressedBuffer;
use crate::chunk::CompressedChunk;
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::options::DecompressOptions;
use crate::CHUNK_SIZE;

/// Required first byte of every container.
pub const CONTAINER_SIGNATURE: u8 = 0x01;

/// Chunks' worth of output reserved before sequential decoding; past that the buffer grows as
/// chunks actually decode.
const INITIAL_RESERVE_CHUNKS: usize = 16;

/// Walks chunk headers, yielding each chunk's span without decoding it.
///
/// Stops after the first error.
#[derive(Clone, Debug)]
pub struct ChunkParser<'a> {
    cursor: ByteCursor<'a>,
    index: usize,
    errored: bool,
}

impl<'a> ChunkParser<'a> {
    /// Start walking at the cursor's current position, which should be just past the container
    /// signature byte.
    pub fn new(cursor: ByteCursor<'a>) -> Self {
        Self {
            cursor,
            index: 0,
            errored: false,
        }
    }
}

impl<'a> std::iter::Iterator for ChunkParser<'a> {
    type Item = Result<CompressedChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored || self.cursor.is_at_end() {
            return None;
        }
        let result = CompressedChunk::read(&mut self.cursor, self.index);
        match result {
            Ok(_) => self.index += 1,
            Err(_) => self.errored = true,
        }
        Some(result)
    }
}

/// A parsed container, holding the span of every chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedContainer<'a> {
    chunks: Vec<CompressedChunk<'a>>,
}

impl<'a> CompressedContainer<'a> {
    /// Check the signature byte and split the rest of `data` into chunks.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let signature = cursor.read_u8("decode container signature")?;
        if signature != CONTAINER_SIGNATURE {
            return Err(Error::BadSignature(signature));
        }
        let chunks = ChunkParser::new(cursor).collect::<Result<Vec<_>>>()?;
        Ok(Self { chunks })
    }

    pub fn chunks(&self) -> &[CompressedChunk<'a>] {
        &self.chunks
    }

    /// Bytes covered by this container: the signature plus every chunk's span.
    pub fn compressed_len(&self) -> usize {
        1 + self.chunks.iter().map(CompressedChunk::span_len).sum::<usize>()
    }

    /// Decompress every chunk and concatenate the results.
    ///
    /// With enough chunks, and a size cap that every chunk at full size would still fit in, the
    /// chunks are decoded in parallel. Otherwise they're decoded in order, checking the size cap
    /// as output accumulates.
    pub fn decompress(&self, options: &DecompressOptions) -> Result<DecompressedBuffer> {
        let upper_bound = self.chunks.len().saturating_mul(CHUNK_SIZE);
        let buf = if options.use_parallel(self.chunks.len()) && upper_bound <= options.max_size {
            let results: Vec<Result<Vec<u8>>> = self
                .chunks
                .par_iter()
                .map(|chunk| chunk.decode(options.short_final_chunk))
                .collect();
            // Report the first failing chunk in container order, as the sequential path does
            let outputs = results.into_iter().collect::<Result<Vec<_>>>()?;
            DecompressedBuffer::from_chunks(outputs)
        } else {
            let capacity = upper_bound
                .min(options.max_size)
                .min(INITIAL_RESERVE_CHUNKS * CHUNK_SIZE);
            let mut buf = DecompressedBuffer::with_capacity(capacity);
            for chunk in self.chunks.iter() {
                let out = chunk.decode(options.short_final_chunk)?;
                let actual = buf.len() + out.len();
                if actual > options.max_size {
                    return Err(Error::LengthTooLong {
                        max: options.max_size,
                        actual,
                    });
                }
                buf.push_chunk(&out);
            }
            buf
        };
        log::debug!(
            "decompressed {} chunks from {} bytes into {} bytes",
            self.chunks.len(),
            self.compressed_len(),
            buf.len()
        );
        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chunk::ChunkHeader;
    use crate::options::ShortChunkPolicy;

    fn container(chunks: &[(bool, &[u8])]) -> Vec<u8> {
        let mut data = vec![CONTAINER_SIGNATURE];
        for (compressed, body) in chunks {
            let header = ChunkHeader::for_body(body.len(), *compressed).unwrap();
            data.extend_from_slice(&header.to_u16().to_le_bytes());
            data.extend_from_slice(body);
        }
        data
    }

    #[test]
    fn empty_container() {
        let parsed = CompressedContainer::parse(&[0x01]).unwrap();
        assert!(parsed.chunks().is_empty());
        let buf = parsed.decompress(&DecompressOptions::default()).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn bad_signature() {
        assert_eq!(
            CompressedContainer::parse(&[0x00, 0x01, 0xB0, 0x00, b'A']),
            Err(Error::BadSignature(0x00))
        );
        assert!(matches!(
            CompressedContainer::parse(&[]),
            Err(Error::LengthTooShort { .. })
        ));
    }

    #[test]
    fn spans_cover_input() {
        let raw = vec![b'r'; CHUNK_SIZE];
        let data = container(&[
            (true, &[0x00, b'a', b'b']),
            (false, &raw),
            (true, &[0x00, b'c']),
        ]);
        let parsed = CompressedContainer::parse(&data).unwrap();
        assert_eq!(parsed.chunks().len(), 3);
        assert_eq!(parsed.compressed_len(), data.len());
        let indices: Vec<usize> = parsed.chunks().iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let finals: Vec<bool> = parsed.chunks().iter().map(|c| c.is_final()).collect();
        assert_eq!(finals, vec![false, false, true]);
    }

    #[test]
    fn bad_chunk_signature_later() {
        let mut data = container(&[(true, &[0x00, b'a']), (true, &[0x00, b'b'])]);
        // Second header starts after signature + 4 bytes of first chunk
        data[6] = 0xA0;
        assert_eq!(
            CompressedContainer::parse(&data),
            Err(Error::BadChunkSignature {
                chunk: 1,
                signature: 0b010
            })
        );
    }

    #[test]
    fn parser_stops_after_error() {
        let data = [0xB0u8];
        let mut parser = ChunkParser::new(ByteCursor::new(&data));
        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
    }

    #[test]
    fn window_resets_per_chunk() {
        // Second chunk starts with a copy token, which can't reach back into the first chunk.
        let data = container(&[(true, &[0x00, b'a', b'b', b'c']), (true, &[0x01, 0x00, 0x00])]);
        let parsed = CompressedContainer::parse(&data).unwrap();
        assert_eq!(
            parsed.decompress(&DecompressOptions::default()),
            Err(Error::BadCopyOffset {
                offset: 1,
                written: 0
            })
        );
    }

    #[test]
    fn size_cap() {
        let data = container(&[(true, &[0x00, b'a', b'b', b'c']), (true, &[0x00, b'd', b'e'])]);
        let parsed = CompressedContainer::parse(&data).unwrap();
        let opts = DecompressOptions::default().max_size(4);
        assert_eq!(
            parsed.decompress(&opts),
            Err(Error::LengthTooLong { max: 4, actual: 5 })
        );
        let opts = opts.max_size(5);
        assert_eq!(&parsed.decompress(&opts).unwrap()[..], b"abcde");
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut chunks: Vec<Vec<u8>> = Vec::new();
        for i in 0..40u8 {
            // Literal, then a copy of offset 1 and length 4095 (0x0FFC at difference 1)
            chunks.push(vec![0b0000_0010, b'a' + (i % 26), 0xFC, 0x0F]);
        }
        chunks.push(vec![0x00, b'e', b'n', b'd']);
        let spans: Vec<(bool, &[u8])> = chunks.iter().map(|c| (true, c.as_slice())).collect();
        let data = container(&spans);
        let parsed = CompressedContainer::parse(&data).unwrap();

        let seq = parsed
            .decompress(&DecompressOptions::default().parallel_threshold(0))
            .unwrap();
        let par = parsed
            .decompress(&DecompressOptions::default().parallel_threshold(2))
            .unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq.len(), 40 * CHUNK_SIZE + 3);
        assert_eq!(seq.chunk(1).unwrap(), &vec![b'b'; CHUNK_SIZE][..]);
        assert_eq!(seq.chunk(40).unwrap(), b"end");
    }

    #[test]
    fn first_error_in_chunk_order() {
        let mut chunks: Vec<Vec<u8>> = Vec::new();
        for i in 0..64u8 {
            chunks.push(vec![0x00, b'a' + (i % 26)]);
        }
        // Copies at the start of a chunk have nothing to reach back to
        chunks[5] = vec![0x01, 0x00, 0x00];
        chunks[50] = vec![0b10, b'a', 0x00, 0x10];
        let spans: Vec<(bool, &[u8])> = chunks.iter().map(|c| (true, c.as_slice())).collect();
        let data = container(&spans);
        let parsed = CompressedContainer::parse(&data).unwrap();

        let expected = Err(Error::BadCopyOffset {
            offset: 1,
            written: 0,
        });
        for threshold in [0, 2] {
            let opts = DecompressOptions::default().parallel_threshold(threshold);
            for _ in 0..20 {
                assert_eq!(parsed.decompress(&opts), expected);
            }
        }
    }

    #[test]
    fn many_tiny_chunks_decode_sequentially() {
        // More chunks than fit under the cap at full size, so decoding can't fan out
        let chunks: Vec<Vec<u8>> = (0..300).map(|_| vec![0x00, b'z']).collect();
        let spans: Vec<(bool, &[u8])> = chunks.iter().map(|c| (true, c.as_slice())).collect();
        let data = container(&spans);
        let parsed = CompressedContainer::parse(&data).unwrap();
        let opts = DecompressOptions::default()
            .max_size(100 * CHUNK_SIZE)
            .parallel_threshold(2);
        let buf = parsed.decompress(&opts).unwrap();
        assert_eq!(buf.len(), 300);
        assert_eq!(buf.chunk_count(), 300);
        assert!(buf.iter().all(|b| *b == b'z'));
    }

    #[test]
    fn short_compressed_chunk_before_last() {
        let data = container(&[
            (true, &[0x00, b'a', b'b']),
            (true, &[0x00, b'c']),
            (true, &[0x00, b'd', b'e']),
        ]);
        let parsed = CompressedContainer::parse(&data).unwrap();
        let buf = parsed.decompress(&DecompressOptions::default()).unwrap();
        assert_eq!(&buf[..], b"abcde");
        assert_eq!(buf.chunk(1), Some(&b"c"[..]));
    }

    #[test]
    fn short_final_raw_chunk() {
        let data = container(&[(true, &[0x00, b'a']), (false, b"tail")]);
        let parsed = CompressedContainer::parse(&data).unwrap();
        assert!(parsed.decompress(&DecompressOptions::default()).is_err());
        let opts = DecompressOptions::default().short_final_chunk(ShortChunkPolicy::Accept);
        assert_eq!(&parsed.decompress(&opts).unwrap()[..], b"atail");
    }
}
