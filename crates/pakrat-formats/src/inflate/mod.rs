//! Raw deflate and zlib decoding
//!
//! Decoding is built directly on [`HuffmanTable`], which is rebuilt for every
//! dynamic block. Stored, fixed and dynamic blocks are supported; preset
//! dictionaries are not.
//!
//! # Usage
//!
//! ```
//! use pakrat_formats::inflate::inflate;
//!
//! // A single fixed-Huffman block holding "abc"
//! let compressed = [0x4b, 0x4c, 0x4a, 0x06, 0x00];
//! assert_eq!(inflate(&compressed, 1024).expect("valid stream"), b"abc");
//! ```

mod bits;
mod error;
mod huffman;

pub use bits::BitReader;
pub use error::{InflateError, InflateResult};
pub use huffman::{HuffmanTable, MAX_BITS, MAX_SYMBOLS};

use std::sync::LazyLock;

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order in which code-length code lengths are transmitted
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

const END_OF_BLOCK: u16 = 256;
const MAX_LITERAL_CODES: usize = 286;
const MAX_DIST_CODES: usize = 30;

struct FixedTables {
    literals: HuffmanTable,
    distances: HuffmanTable,
}

static FIXED: LazyLock<Option<FixedTables>> = LazyLock::new(|| {
    let mut lengths = [0u8; MAX_SYMBOLS];
    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);

    Some(FixedTables {
        literals: HuffmanTable::build(&lengths).ok()?,
        distances: HuffmanTable::build(&[5u8; MAX_DIST_CODES]).ok()?,
    })
});

/// Decode a raw deflate stream
///
/// `max_output` bounds the decoded size; exceeding it is an error rather
/// than a truncation.
pub fn inflate(data: &[u8], max_output: usize) -> InflateResult<Vec<u8>> {
    let mut reader = BitReader::new(data);
    inflate_from(&mut reader, max_output)
}

/// Decode a zlib stream (RFC 1950) and verify its Adler-32 trailer
pub fn zlib_inflate(data: &[u8], max_output: usize) -> InflateResult<Vec<u8>> {
    let (&cmf, &flg) = match data {
        [cmf, flg, ..] => (cmf, flg),
        _ => return Err(InflateError::UnexpectedEof),
    };
    if cmf & 0x0F != 8 || cmf >> 4 > 7 || (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
        return Err(InflateError::InvalidZlibHeader(cmf, flg));
    }
    if flg & 0x20 != 0 {
        return Err(InflateError::PresetDictionary);
    }

    let mut reader = BitReader::new(&data[2..]);
    let output = inflate_from(&mut reader, max_output)?;

    let trailer = reader.take_bytes(4)?;
    let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = adler32(&output);
    if expected != actual {
        return Err(InflateError::ChecksumMismatch { expected, actual });
    }

    Ok(output)
}

/// Adler-32 checksum
pub fn adler32(data: &[u8]) -> u32 {
    const MOD: u32 = 65_521;
    let (mut a, mut b) = (1u32, 0u32);
    // 5552 is the largest run that cannot overflow before reduction
    for chunk in data.chunks(5552) {
        for &byte in chunk {
            a += u32::from(byte);
            b += a;
        }
        a %= MOD;
        b %= MOD;
    }
    (b << 16) | a
}

fn inflate_from(reader: &mut BitReader<'_>, max_output: usize) -> InflateResult<Vec<u8>> {
    let mut output = Vec::new();

    loop {
        let last = reader.bit()? == 1;
        match reader.bits(2)? {
            0 => stored(reader, &mut output, max_output)?,
            1 => {
                let fixed = FIXED.as_ref().ok_or(InflateError::Incomplete)?;
                codes(
                    reader,
                    &mut output,
                    &fixed.literals,
                    &fixed.distances,
                    max_output,
                )?;
            }
            2 => {
                let (literals, distances) = dynamic_tables(reader)?;
                codes(reader, &mut output, &literals, &distances, max_output)?;
            }
            other => return Err(InflateError::InvalidBlockType(other)),
        }

        if last {
            return Ok(output);
        }
    }
}

fn stored(reader: &mut BitReader<'_>, output: &mut Vec<u8>, max_output: usize) -> InflateResult<()> {
    let header = reader.take_bytes(4)?;
    let len = u16::from_le_bytes([header[0], header[1]]);
    let nlen = u16::from_le_bytes([header[2], header[3]]);
    if len != !nlen {
        return Err(InflateError::StoredLengthMismatch { len, nlen });
    }

    let bytes = reader.take_bytes(usize::from(len))?;
    if output.len() + bytes.len() > max_output {
        return Err(InflateError::OutputLimit(max_output));
    }
    output.extend_from_slice(bytes);
    Ok(())
}

fn dynamic_tables(reader: &mut BitReader<'_>) -> InflateResult<(HuffmanTable, HuffmanTable)> {
    let literal_count = reader.bits(5)? as usize + 257;
    let dist_count = reader.bits(5)? as usize + 1;
    let code_count = reader.bits(4)? as usize + 4;
    if literal_count > MAX_LITERAL_CODES || dist_count > MAX_DIST_CODES {
        return Err(InflateError::InvalidHeader("too many length or distance codes"));
    }

    let mut code_lengths = [0u8; 19];
    for &index in &CODE_LENGTH_ORDER[..code_count] {
        code_lengths[index] = reader.bits(3)? as u8;
    }
    let length_code = HuffmanTable::build(&code_lengths)?;
    if !length_code.is_complete() {
        return Err(InflateError::Incomplete);
    }

    let total = literal_count + dist_count;
    let mut lengths = [0u8; MAX_LITERAL_CODES + MAX_DIST_CODES];
    let mut index = 0;
    while index < total {
        let symbol = length_code.decode(reader)?;
        if symbol < 16 {
            lengths[index] = symbol as u8;
            index += 1;
            continue;
        }

        let (value, repeat) = match symbol {
            16 => {
                if index == 0 {
                    return Err(InflateError::InvalidHeader("repeat with no first length"));
                }
                (lengths[index - 1], 3 + reader.bits(2)? as usize)
            }
            17 => (0, 3 + reader.bits(3)? as usize),
            _ => (0, 11 + reader.bits(7)? as usize),
        };
        if index + repeat > total {
            return Err(InflateError::InvalidHeader("too many lengths"));
        }
        lengths[index..index + repeat].fill(value);
        index += repeat;
    }

    if lengths[usize::from(END_OF_BLOCK)] == 0 {
        return Err(InflateError::InvalidHeader("no end-of-block code"));
    }

    let literals = HuffmanTable::build(&lengths[..literal_count])?;
    // A lone code of length one is the only incomplete set allowed
    if !literals.is_complete() && literal_count - usize::from(literals.counts[0]) != 1 {
        return Err(InflateError::Incomplete);
    }

    let distances = HuffmanTable::build(&lengths[literal_count..total])?;
    if !distances.is_complete() && dist_count - usize::from(distances.counts[0]) != 1 {
        return Err(InflateError::Incomplete);
    }

    Ok((literals, distances))
}

fn codes(
    reader: &mut BitReader<'_>,
    output: &mut Vec<u8>,
    literals: &HuffmanTable,
    distances: &HuffmanTable,
    max_output: usize,
) -> InflateResult<()> {
    loop {
        let symbol = literals.decode(reader)?;
        match symbol {
            0..=255 => {
                if output.len() >= max_output {
                    return Err(InflateError::OutputLimit(max_output));
                }
                output.push(symbol as u8);
            }
            END_OF_BLOCK => return Ok(()),
            _ => {
                let index = usize::from(symbol - 257);
                if index >= LENGTH_BASE.len() {
                    return Err(InflateError::InvalidSymbol(symbol));
                }
                let length = usize::from(LENGTH_BASE[index])
                    + reader.bits(u32::from(LENGTH_EXTRA[index]))? as usize;

                let dist_symbol = distances.decode(reader)?;
                let dist_index = usize::from(dist_symbol);
                if dist_index >= DIST_BASE.len() {
                    return Err(InflateError::InvalidSymbol(dist_symbol));
                }
                let distance = usize::from(DIST_BASE[dist_index])
                    + reader.bits(u32::from(DIST_EXTRA[dist_index]))? as usize;

                if distance > output.len() {
                    return Err(InflateError::DistanceTooFar {
                        distance,
                        available: output.len(),
                    });
                }
                if output.len() + length > max_output {
                    return Err(InflateError::OutputLimit(max_output));
                }

                // Overlapping copies repeat the pattern byte by byte
                let start = output.len() - distance;
                for i in 0..length {
                    let byte = output[start + i];
                    output.push(byte);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::huffman::tests::BitWriter;
    use super::*;
    use flate2::Compression;
    use flate2::write::{DeflateEncoder, ZlibEncoder};
    use proptest::prelude::*;
    use std::io::Write;

    const LIMIT: usize = 16 * 1024 * 1024;

    fn deflate(data: &[u8], level: Compression) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), level);
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn sample_text() -> Vec<u8> {
        let mut text = Vec::new();
        for i in 0..2000 {
            text.extend_from_slice(format!("entry {i}: units\\human\\footman.mdx ").as_bytes());
        }
        text
    }

    #[test]
    fn test_fixed_block() {
        assert_eq!(inflate(&[0x4b, 0x4c, 0x4a, 0x06, 0x00], LIMIT).unwrap(), b"abc");
    }

    #[test]
    fn test_stored_blocks() {
        let data = sample_text();
        let compressed = deflate(&data, Compression::none());
        assert_eq!(inflate(&compressed, LIMIT).unwrap(), data);
    }

    #[test]
    fn test_dynamic_blocks() {
        let data = sample_text();
        let compressed = deflate(&data, Compression::best());
        assert!(compressed.len() < data.len() / 4);
        assert_eq!(inflate(&compressed, LIMIT).unwrap(), data);
    }

    #[test]
    fn test_empty_input() {
        let compressed = deflate(b"", Compression::default());
        assert!(inflate(&compressed, LIMIT).unwrap().is_empty());
        assert_eq!(inflate(&[], LIMIT), Err(InflateError::UnexpectedEof));
    }

    #[test]
    fn test_zlib() {
        let data = sample_text();
        let compressed = zlib(&data);
        assert_eq!(zlib_inflate(&compressed, LIMIT).unwrap(), data);
    }

    #[test]
    fn test_zlib_bad_checksum() {
        let mut compressed = zlib(b"checksummed payload");
        let last = compressed.len() - 1;
        compressed[last] ^= 0xFF;
        assert!(matches!(
            zlib_inflate(&compressed, LIMIT),
            Err(InflateError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_zlib_bad_header() {
        assert_eq!(
            zlib_inflate(&[0x79, 0x9c, 0x00], LIMIT),
            Err(InflateError::InvalidZlibHeader(0x79, 0x9c))
        );
    }

    #[test]
    fn test_output_limit() {
        let data = vec![0u8; 100_000];
        let compressed = deflate(&data, Compression::default());
        assert_eq!(
            inflate(&compressed, 1000),
            Err(InflateError::OutputLimit(1000))
        );
    }

    #[test]
    fn test_stored_length_mismatch() {
        let mut writer = BitWriter::default();
        writer.put_bits(1, 1);
        writer.put_bits(0, 2);
        let mut data = writer.finish();
        data.extend_from_slice(&[0x03, 0x00, 0x00, 0x00, b'a', b'b', b'c']);
        assert_eq!(
            inflate(&data, LIMIT),
            Err(InflateError::StoredLengthMismatch { len: 3, nlen: 0 })
        );
    }

    #[test]
    fn test_distance_too_far() {
        // Fixed block: length symbol 257 (code 0000001), distance symbol 0
        let mut writer = BitWriter::default();
        writer.put_bits(1, 1);
        writer.put_bits(1, 2);
        writer.put_code(0b000_0001, 7);
        writer.put_code(0, 5);
        let data = writer.finish();
        assert_eq!(
            inflate(&data, LIMIT),
            Err(InflateError::DistanceTooFar {
                distance: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_reserved_block_type() {
        assert_eq!(inflate(&[0x07], LIMIT), Err(InflateError::InvalidBlockType(3)));
    }

    #[test]
    fn test_adler32() {
        assert_eq!(adler32(b""), 1);
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }

    proptest! {
        #[test]
        fn prop_matches_reference_encoder(data in proptest::collection::vec(any::<u8>(), 0..4096),
                                          level in 0u32..=9) {
            let compressed = deflate(&data, Compression::new(level));
            prop_assert_eq!(inflate(&compressed, LIMIT).unwrap(), data);
        }

        #[test]
        fn prop_repetitive_input(seed in proptest::collection::vec(any::<u8>(), 1..16), repeats in 1usize..500) {
            let data: Vec<u8> = seed.iter().copied().cycle().take(seed.len() * repeats).collect();
            let compressed = deflate(&data, Compression::default());
            prop_assert_eq!(inflate(&compressed, LIMIT).unwrap(), data);
        }
    }
}
