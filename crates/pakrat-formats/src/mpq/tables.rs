//! Encrypted hash and block tables

use super::header::{BlockEntry, HashEntry, TABLE_ENTRY_SIZE};
use crate::plugin::{PluginError, PluginResult};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use pakrat_crypto::lut::{CryptoLut, HashType};
use pakrat_crypto::mpq::{decrypt_block, encrypt_block};

/// Name whose file-key hash encrypts the hash table
pub const HASH_TABLE_NAME: &str = "(hash table)";
/// Name whose file-key hash encrypts the block table
pub const BLOCK_TABLE_NAME: &str = "(block table)";

fn table_key(name: &str) -> u32 {
    CryptoLut::shared().hash_string(name, HashType::FileKey)
}

/// Hash table with open addressing and linear probing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTable {
    entries: Vec<HashEntry>,
}

impl HashTable {
    /// Empty table sized for `files` entries
    pub fn for_files(files: usize) -> Self {
        let size = files.saturating_mul(2).next_power_of_two().max(16);
        Self {
            entries: vec![HashEntry::empty(); size],
        }
    }

    /// Decrypt and parse a stored table
    pub fn parse(mut bytes: Vec<u8>) -> PluginResult<Self> {
        let count = bytes.len() as u64 / TABLE_ENTRY_SIZE;
        if !count.is_power_of_two() {
            return Err(PluginError::malformed(format!(
                "hash table size {count} is not a power of two"
            )));
        }
        decrypt_block(&mut bytes, table_key(HASH_TABLE_NAME));

        let mut cursor = Cursor::new(&bytes);
        let entries = (0..count)
            .map(|_| HashEntry::read(&mut cursor))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no slots
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn probe(&self, name: &str) -> impl Iterator<Item = (usize, &HashEntry)> {
        let mask = self.entries.len().wrapping_sub(1);
        let start = CryptoLut::shared().hash_string(name, HashType::TableOffset) as usize;
        (0..self.entries.len()).map(move |i| {
            let slot = start.wrapping_add(i) & mask;
            (slot, &self.entries[slot])
        })
    }

    /// Block indices stored under `name`, one per locale
    pub fn find(&self, name: &str) -> Vec<u32> {
        let lut = CryptoLut::shared();
        let name_a = lut.hash_string(name, HashType::NameA);
        let name_b = lut.hash_string(name, HashType::NameB);

        self.probe(name)
            .map(|(_, entry)| entry)
            .take_while(|entry| !entry.is_empty())
            .filter(|entry| {
                entry.block_index != HashEntry::DELETED
                    && entry.name_a == name_a
                    && entry.name_b == name_b
            })
            .map(|entry| entry.block_index)
            .collect()
    }

    /// Add `name` pointing at `block_index`
    pub fn insert(&mut self, name: &str, block_index: u32) -> PluginResult<()> {
        if !self.find(name).is_empty() {
            return Err(PluginError::Unsupported(format!("duplicate entry name {name}")));
        }

        let slot = self
            .probe(name)
            .find(|(_, entry)| entry.is_empty() || entry.block_index == HashEntry::DELETED)
            .map(|(slot, _)| slot)
            .ok_or_else(|| PluginError::Unsupported("hash table is full".into()))?;

        let lut = CryptoLut::shared();
        self.entries[slot] = HashEntry {
            name_a: lut.hash_string(name, HashType::NameA),
            name_b: lut.hash_string(name, HashType::NameB),
            locale: 0,
            platform: 0,
            block_index,
        };
        Ok(())
    }

    /// Serialize and encrypt
    pub fn to_bytes(&self) -> PluginResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        for entry in &self.entries {
            entry.write(&mut cursor)?;
        }
        let mut bytes = cursor.into_inner();
        encrypt_block(&mut bytes, table_key(HASH_TABLE_NAME));
        Ok(bytes)
    }
}

/// Decrypt and parse a stored block table
pub fn parse_block_table(mut bytes: Vec<u8>) -> PluginResult<Vec<BlockEntry>> {
    decrypt_block(&mut bytes, table_key(BLOCK_TABLE_NAME));
    let count = bytes.len() as u64 / TABLE_ENTRY_SIZE;
    let mut cursor = Cursor::new(&bytes);
    Ok((0..count)
        .map(|_| BlockEntry::read(&mut cursor))
        .collect::<Result<Vec<_>, _>>()?)
}

/// Serialize and encrypt a block table
pub fn block_table_bytes(blocks: &[BlockEntry]) -> PluginResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    for block in blocks {
        block.write(&mut cursor)?;
    }
    let mut bytes = cursor.into_inner();
    encrypt_block(&mut bytes, table_key(BLOCK_TABLE_NAME));
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mpq::header::flags;

    #[test]
    fn test_table_keys() {
        assert_eq!(table_key(HASH_TABLE_NAME), 0xC3AF_3770);
        assert_eq!(table_key(BLOCK_TABLE_NAME), 0xEC83_B3A3);
    }

    #[test]
    fn test_insert_and_find() {
        let mut table = HashTable::for_files(3);
        assert_eq!(table.len(), 16);

        table.insert("(listfile)", 0).unwrap();
        table.insert("war3map.j", 1).unwrap();
        table.insert("Units\\Human\\Footman.mdx", 2).unwrap();

        assert_eq!(table.find("(LISTFILE)"), vec![0]);
        assert_eq!(table.find("units/human/footman.mdx"), vec![2]);
        assert!(table.find("war3map.w3e").is_empty());
        assert!(table.insert("War3map.J", 3).is_err());
    }

    #[test]
    fn test_listfile_slot() {
        let mut table = HashTable::for_files(1);
        table.insert("(listfile)", 7).unwrap();
        // 0x5F3DE859 & 15
        assert_eq!(table.entries[9].block_index, 7);
        assert_eq!(table.entries[9].name_a, 0xFD65_7910);
        assert_eq!(table.entries[9].name_b, 0x4E9B_98A7);
    }

    #[test]
    fn test_encrypted_round_trip() {
        let mut table = HashTable::for_files(2);
        table.insert("a.txt", 0).unwrap();
        table.insert("b.txt", 1).unwrap();

        let bytes = table.to_bytes().unwrap();
        assert_eq!(bytes.len(), 16 * 16);
        assert_eq!(HashTable::parse(bytes).unwrap(), table);

        let blocks = vec![BlockEntry {
            file_pos: 32,
            compressed_size: 10,
            file_size: 20,
            flags: flags::EXISTS | flags::COMPRESS,
        }];
        let bytes = block_table_bytes(&blocks).unwrap();
        assert_ne!(&bytes[..4], &32u32.to_le_bytes());
        assert_eq!(parse_block_table(bytes).unwrap(), blocks);
    }

    #[test]
    fn test_rejects_odd_hash_table() {
        assert!(HashTable::parse(vec![0u8; 48]).unwrap_err().is_malformed());
    }

    #[test]
    fn test_full_table() {
        let mut table = HashTable::for_files(0);
        for i in 0..16 {
            table.insert(&format!("file{i}"), i).unwrap();
        }
        assert!(matches!(table.insert("one-more", 16), Err(PluginError::Unsupported(_))));
    }
}
