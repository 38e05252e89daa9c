//! CopyToken bit-packing.
//!
//! A CopyToken is a little-endian u16 split into an offset field (high bits) and a length field
//! (low bits). Where the split falls depends on how many bytes the current chunk has produced so
//! far: the further into the chunk, the more bits go to the offset. The same 16-bit value can
//! therefore mean different things at different points in a chunk, so tokens must be decoded
//! strictly in order.

use crate::error::{Error, Result};

/// Mask and width values for CopyTokens at a given position within a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyTokenHelp {
    /// Number of bits in the offset field. Always within 4..=12.
    pub bit_count: u32,
    pub length_mask: u16,
    pub offset_mask: u16,
    /// Largest length a token can encode at this position.
    pub maximum_length: usize,
}

impl CopyTokenHelp {
    /// Compute the field layout for `difference`, the number of bytes already written in the
    /// current chunk.
    pub fn new(difference: usize) -> Self {
        let mut bit_count = 0u32;
        while bit_count < 12 && (1usize << bit_count) < difference {
            bit_count += 1;
        }
        let bit_count = bit_count.max(4);
        let length_mask = 0xFFFFu16 >> bit_count;
        Self {
            bit_count,
            length_mask,
            offset_mask: !length_mask,
            maximum_length: length_mask as usize + 3,
        }
    }

    /// Largest offset a token can encode at this position.
    pub fn maximum_offset(&self) -> usize {
        1 << self.bit_count
    }
}

/// A back-reference: copy `length` bytes starting `offset` bytes behind the write position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyToken {
    pub offset: usize,
    pub length: usize,
}

impl CopyToken {
    /// Split a raw token into its offset and length, given the bytes written so far in the chunk.
    pub fn unpack(token: u16, difference: usize) -> Result<Self> {
        let help = CopyTokenHelp::new(difference);
        let length = (token & help.length_mask) as usize + 3;
        if length > help.maximum_length {
            return Err(Error::BadCopyLength {
                token,
                length,
                max: help.maximum_length,
            });
        }
        let offset = ((token & help.offset_mask) >> (16 - help.bit_count)) as usize + 1;
        Ok(Self { offset, length })
    }

    /// Pack this token for the given position. Returns `None` if the offset or length doesn't
    /// fit the field widths available there.
    pub fn pack(&self, difference: usize) -> Option<u16> {
        let help = CopyTokenHelp::new(difference);
        if self.length < 3 || self.length > help.maximum_length {
            return None;
        }
        if self.offset == 0 || self.offset > help.maximum_offset() {
            return None;
        }
        let offset = (self.offset - 1) as u16;
        let length = (self.length - 3) as u16;
        Some((offset << (16 - help.bit_count)) | length)
    }

    /// Append the referenced bytes to `output`, which must hold only the current chunk.
    ///
    /// Lengths longer than the offset repeat the referenced run cyclically.
    pub fn expand(&self, output: &mut Vec<u8>) -> Result<()> {
        let written = output.len();
        if self.offset == 0 || self.offset > written {
            return Err(Error::BadCopyOffset {
                offset: self.offset,
                written,
            });
        }
        let start = written - self.offset;
        if self.length <= self.offset {
            output.extend_from_within(start..start + self.length);
        } else {
            output.reserve(self.length);
            for i in 0..self.length {
                let b = output[start + i];
                output.push(b);
            }
        }
        Ok(())
    }
}
