//! Bounds-checked sequential reading over an in-memory byte buffer.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};

/// A reader over a byte slice with an absolute position.
///
/// Every read is checked against the bytes actually remaining; declared lengths found in the
/// data are never trusted on their own. All integers are little-endian.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Absolute position from the start of the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Move to an absolute position. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::LengthTooShort {
                step: "seek",
                actual: self.data.len(),
                expected: position,
            });
        }
        self.position = position;
        Ok(())
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.rest().first().copied()
    }

    pub fn read_u8(&mut self, step: &'static str) -> Result<u8> {
        let mut rest = self.rest();
        let v = rest.read_u8().map_err(|_| Error::LengthTooShort {
            step,
            actual: 0,
            expected: 1,
        })?;
        self.position += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self, step: &'static str) -> Result<u16> {
        let mut rest = self.rest();
        let v = rest
            .read_u16::<LittleEndian>()
            .map_err(|_| Error::LengthTooShort {
                step,
                actual: self.remaining(),
                expected: 2,
            })?;
        self.position += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self, step: &'static str) -> Result<u32> {
        let mut rest = self.rest();
        let v = rest
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::LengthTooShort {
                step,
                actual: self.remaining(),
                expected: 4,
            })?;
        self.position += 4;
        Ok(v)
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_bytes(&mut self, len: usize, step: &'static str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::LengthTooShort {
                step,
                actual: self.remaining(),
                expected: len,
            });
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    /// Split off the next `len` bytes as an independent cursor.
    pub fn sub_cursor(&mut self, len: usize, step: &'static str) -> Result<ByteCursor<'a>> {
        Ok(ByteCursor::new(self.read_bytes(len, step)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn little_endian_reads() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8("a").unwrap(), 0x01);
        assert_eq!(cursor.read_u16("b").unwrap(), 0x1234);
        assert_eq!(cursor.read_u32("c").unwrap(), 0x12345678);
        assert!(cursor.is_at_end());
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn peek_does_not_consume() {
        let data = [0xaa, 0xbb];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.peek_u8(), Some(0xaa));
        assert_eq!(cursor.peek_u8(), Some(0xaa));
        assert_eq!(cursor.read_u8("a").unwrap(), 0xaa);
        assert_eq!(cursor.peek_u8(), Some(0xbb));
        cursor.read_u8("b").unwrap();
        assert_eq!(cursor.peek_u8(), None);
    }

    #[test]
    fn not_enough_bytes() {
        let data = [0x01];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_u16("decode thing"),
            Err(Error::LengthTooShort {
                step: "decode thing",
                actual: 1,
                expected: 2,
            })
        );
        // A failed read leaves the position alone
        assert_eq!(cursor.position(), 0);
        assert!(cursor.read_u32("x").is_err());
        assert!(cursor.read_bytes(2, "y").is_err());
        assert_eq!(cursor.read_bytes(1, "z").unwrap(), &[0x01]);
        assert!(cursor.read_u8("w").is_err());
    }

    #[test]
    fn sub_cursor_and_seek() {
        let data = [1, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&data);
        cursor.seek(1).unwrap();
        let mut sub = cursor.sub_cursor(3, "sub").unwrap();
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.read_u8("a").unwrap(), 2);
        assert_eq!(sub.remaining(), 2);
        assert_eq!(cursor.position(), 4);
        assert!(cursor.seek(6).is_err());
        cursor.seek(5).unwrap();
        assert!(cursor.is_at_end());
    }
}
