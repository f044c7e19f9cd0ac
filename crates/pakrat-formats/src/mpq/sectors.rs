//! Sector layout of stored MPQ entries
//!
//! Unless an entry is a single unit, its data is split into sectors of the
//! archive's sector size. Compressed entries start with a table of sector
//! offsets; each stored sector shorter than its decoded size begins with a
//! compression mask byte. Encrypted sectors use the entry key plus the
//! sector index, and the offset table uses the entry key minus one.

use super::header::{MASK_ZLIB, flags};
use crate::inflate::zlib_inflate;
use crate::plugin::{PluginError, PluginResult};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use pakrat_crypto::mpq::{decrypt_block, encrypt_block};
use std::io::Write;

/// How one entry is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredLayout {
    /// Archive sector size
    pub sector_size: u64,
    /// Block flags
    pub flags: u32,
    /// Entry key, when known
    pub key: Option<u32>,
    /// Decoded size
    pub file_size: u64,
}

impl StoredLayout {
    fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    fn sector_count(&self) -> u64 {
        self.file_size.div_ceil(self.sector_size)
    }

    fn sector_len(&self, index: u64) -> u64 {
        self.sector_size
            .min(self.file_size - index * self.sector_size)
    }
}

fn sector_key(key: u32, index: u64) -> u32 {
    key.wrapping_add(index as u32)
}

/// Decode the stored bytes of one entry
pub fn decode(stored: &[u8], layout: &StoredLayout) -> PluginResult<Vec<u8>> {
    if layout.has(flags::IMPLODE) {
        return Err(PluginError::Unsupported("PKWARE implode compression".into()));
    }
    let key = if layout.has(flags::ENCRYPTED) {
        Some(layout.key.ok_or_else(|| {
            PluginError::Unsupported("encrypted entry with unknown name".into())
        })?)
    } else {
        None
    };
    if layout.file_size == 0 {
        return Ok(Vec::new());
    }

    let data = if layout.has(flags::SINGLE_UNIT) {
        let mut data = stored.to_vec();
        if let Some(key) = key {
            decrypt_block(&mut data, key);
        }
        if layout.has(flags::COMPRESS) && (data.len() as u64) < layout.file_size {
            decompress_sector(&data, layout.file_size)?
        } else {
            data
        }
    } else if layout.has(flags::COMPRESS) {
        decode_sectors(stored, layout, key)?
    } else {
        let mut data = stored.to_vec();
        if let Some(key) = key {
            for (index, sector) in data.chunks_mut(layout.sector_size as usize).enumerate() {
                decrypt_block(sector, sector_key(key, index as u64));
            }
        }
        data
    };

    finish(data, layout.file_size)
}

fn decode_sectors(stored: &[u8], layout: &StoredLayout, key: Option<u32>) -> PluginResult<Vec<u8>> {
    let sectors = layout.sector_count();
    let entries = sectors + 1 + u64::from(layout.has(flags::SECTOR_CRC));
    let table_len = usize::try_from(entries * 4)
        .map_err(|_| PluginError::malformed("sector table too large"))?;
    if stored.len() < table_len {
        return Err(PluginError::malformed(format!(
            "sector table needs {table_len} bytes, entry has {}",
            stored.len()
        )));
    }

    let mut table = stored[..table_len].to_vec();
    if let Some(key) = key {
        decrypt_block(&mut table, key.wrapping_sub(1));
    }
    let offsets: Vec<usize> = table
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as usize)
        .collect();

    let mut data = Vec::with_capacity(layout.file_size as usize);
    for index in 0..sectors {
        let (start, end) = (offsets[index as usize], offsets[index as usize + 1]);
        if start > end || end > stored.len() {
            return Err(PluginError::malformed(format!(
                "sector {index} spans {start}..{end} of a {}-byte entry",
                stored.len()
            )));
        }

        let mut sector = stored[start..end].to_vec();
        if let Some(key) = key {
            decrypt_block(&mut sector, sector_key(key, index));
        }
        let expected = layout.sector_len(index);
        if (sector.len() as u64) < expected {
            data.extend_from_slice(&decompress_sector(&sector, expected)?);
        } else {
            data.extend_from_slice(&sector);
        }
    }
    Ok(data)
}

fn decompress_sector(sector: &[u8], expected: u64) -> PluginResult<Vec<u8>> {
    let (&mask, body) = sector
        .split_first()
        .ok_or_else(|| PluginError::malformed("empty compressed sector"))?;
    if mask != MASK_ZLIB {
        return Err(PluginError::Unsupported(format!(
            "sector compression mask {mask:#04x}"
        )));
    }
    let limit = usize::try_from(expected).unwrap_or(usize::MAX);
    let data = zlib_inflate(body, limit)?;
    finish(data, expected)
}

fn finish(mut data: Vec<u8>, expected: u64) -> PluginResult<Vec<u8>> {
    if (data.len() as u64) < expected {
        return Err(PluginError::malformed(format!(
            "decoded {} bytes, expected {expected}",
            data.len()
        )));
    }
    data.truncate(expected as usize);
    Ok(data)
}

/// Encode `data` as sectors; returns the stored bytes and the flags to set
pub fn encode(
    data: &[u8],
    sector_size: u64,
    compress: bool,
    key: Option<u32>,
) -> PluginResult<(Vec<u8>, u32)> {
    let mut block_flags = if key.is_some() { flags::ENCRYPTED } else { 0 };
    if data.is_empty() {
        return Ok((Vec::new(), block_flags));
    }

    let chunks: Vec<&[u8]> = data.chunks(sector_size as usize).collect();
    let mut sectors = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let mut sector = if compress {
            compress_sector(chunk)?
        } else {
            chunk.to_vec()
        };
        if let Some(key) = key {
            encrypt_block(&mut sector, sector_key(key, sectors.len() as u64));
        }
        sectors.push(sector);
    }

    let mut stored = Vec::new();
    if compress {
        block_flags |= flags::COMPRESS;
        let mut offset = (sectors.len() as u32 + 1) * 4;
        let mut table = Vec::with_capacity(offset as usize);
        table.extend_from_slice(&offset.to_le_bytes());
        for sector in &sectors {
            offset += sector.len() as u32;
            table.extend_from_slice(&offset.to_le_bytes());
        }
        if let Some(key) = key {
            encrypt_block(&mut table, key.wrapping_sub(1));
        }
        stored.extend_from_slice(&table);
    }
    for sector in sectors {
        stored.extend_from_slice(&sector);
    }
    Ok((stored, block_flags))
}

fn compress_sector(chunk: &[u8]) -> PluginResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(vec![MASK_ZLIB], Compression::default());
    encoder.write_all(chunk)?;
    let compressed = encoder.finish()?;
    if compressed.len() < chunk.len() {
        Ok(compressed)
    } else {
        Ok(chunk.to_vec())
    }
}
