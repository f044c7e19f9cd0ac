//! Canonical Huffman decode tables
//!
//! A table is rebuilt from per-symbol code lengths for every compressed
//! block. Symbols are ordered by code length and then by symbol index, and
//! codes of one length are consecutive, so two arrays are enough to decode:
//! how many codes each length has, and the symbols in canonical order.

use super::bits::BitReader;
use super::error::{InflateError, InflateResult};

/// Longest code length the format allows
pub const MAX_BITS: usize = 15;

/// Largest alphabet (literal/length codes)
pub const MAX_SYMBOLS: usize = 288;

/// Decode table for one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    /// Number of codes of each length; index 0 counts unused symbols
    pub counts: [u16; MAX_BITS + 1],
    /// Symbols ordered by canonical code
    pub symbols: [u16; MAX_SYMBOLS],
    /// Unused code space left after assignment (0 when complete)
    left: i32,
}

impl HuffmanTable {
    /// Build a table from code lengths, one per symbol
    ///
    /// A length of zero means the symbol has no code. Incomplete code sets
    /// are accepted here; callers that need a complete set check
    /// [`HuffmanTable::is_complete`].
    pub fn build(lengths: &[u8]) -> InflateResult<Self> {
        if lengths.len() > MAX_SYMBOLS {
            return Err(InflateError::TooManySymbols(lengths.len()));
        }

        let mut counts = [0u16; MAX_BITS + 1];
        for (symbol, &length) in lengths.iter().enumerate() {
            if usize::from(length) > MAX_BITS {
                return Err(InflateError::CodeLengthTooLong { symbol, length });
            }
            counts[usize::from(length)] += 1;
        }

        let mut symbols = [0u16; MAX_SYMBOLS];
        if usize::from(counts[0]) == lengths.len() {
            // No codes at all; decoding anything is an error
            return Ok(Self {
                counts,
                symbols,
                left: 0,
            });
        }

        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left <<= 1;
            left -= i32::from(count);
            if left < 0 {
                return Err(InflateError::OverSubscribed);
            }
        }

        let mut offsets = [0u16; MAX_BITS + 1];
        for len in 1..MAX_BITS {
            offsets[len + 1] = offsets[len] + counts[len];
        }

        for (symbol, &length) in lengths.iter().enumerate() {
            if length != 0 {
                let slot = &mut offsets[usize::from(length)];
                symbols[usize::from(*slot)] = symbol as u16;
                *slot += 1;
            }
        }

        Ok(Self {
            counts,
            symbols,
            left,
        })
    }

    /// Whether every code of the prefix space is assigned
    pub fn is_complete(&self) -> bool {
        self.left == 0
    }

    /// Number of symbols that have a code
    pub fn coded_symbols(&self) -> usize {
        self.counts[1..].iter().map(|&c| usize::from(c)).sum()
    }

    /// Decode one symbol
    ///
    /// Codes are stored most-significant bit first inside the LSB-first
    /// stream, so the code is accumulated one bit at a time.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> InflateResult<u16> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;

        for &count in &self.counts[1..] {
            code |= reader.bit()? as i32;
            let count = i32::from(count);
            if code - count < first {
                return Ok(self.symbols[(index + (code - first)) as usize]);
            }
            index += count;
            first += count;
            first <<= 1;
            code <<= 1;
        }

        Err(InflateError::InvalidCode)
    }
}
