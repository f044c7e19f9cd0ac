//! LSB-first bit input for deflate streams

use super::error::{InflateError, InflateResult};

/// Reads bits least-significant first from a byte slice
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_buf: u32,
    bit_count: u32,
}

impl<'a> BitReader<'a> {
    /// Start reading at the first bit of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_buf: 0,
            bit_count: 0,
        }
    }

    /// Read `need` bits (at most 16) as an integer
    pub fn bits(&mut self, need: u32) -> InflateResult<u32> {
        debug_assert!(need <= 16);
        while self.bit_count < need {
            let byte = *self.data.get(self.pos).ok_or(InflateError::UnexpectedEof)?;
            self.pos += 1;
            self.bit_buf |= u32::from(byte) << self.bit_count;
            self.bit_count += 8;
        }

        let value = self.bit_buf & ((1u32 << need) - 1);
        self.bit_buf >>= need;
        self.bit_count -= need;
        Ok(value)
    }

    /// Read a single bit
    #[inline]
    pub fn bit(&mut self) -> InflateResult<u32> {
        self.bits(1)
    }

    /// Drop buffered bits up to the next byte boundary
    pub fn align_to_byte(&mut self) {
        self.bit_buf = 0;
        self.bit_count = 0;
    }

    /// Take `len` whole bytes after aligning
    pub fn take_bytes(&mut self, len: usize) -> InflateResult<&'a [u8]> {
        self.align_to_byte();
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(InflateError::UnexpectedEof)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Bytes consumed so far, counting a partly-read byte as consumed
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_first() {
        let mut reader = BitReader::new(&[0b1010_0110, 0xFF]);
        assert_eq!(reader.bits(1).unwrap(), 0);
        assert_eq!(reader.bits(2).unwrap(), 0b11);
        assert_eq!(reader.bits(5).unwrap(), 0b10100);
        assert_eq!(reader.bits(8).unwrap(), 0xFF);
        assert_eq!(reader.bit(), Err(InflateError::UnexpectedEof));
    }

    #[test]
    fn test_take_bytes_aligns() {
        let mut reader = BitReader::new(&[0x01, 0xAA, 0xBB, 0xCC]);
        assert_eq!(reader.bits(3).unwrap(), 1);
        assert_eq!(reader.take_bytes(2).unwrap(), &[0xAA, 0xBB]);
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.take_bytes(2), Err(InflateError::UnexpectedEof));
    }
}
