//! MPQ archive header, table entries and block flags

use binrw::{BinRead, BinWrite};

/// Archive header signature
pub const MPQ_MAGIC: [u8; 4] = *b"MPQ\x1A";
/// User data header signature
pub const USER_DATA_MAGIC: [u8; 4] = *b"MPQ\x1B";
/// Warcraft III map preamble
pub const MAP_PREAMBLE_MAGIC: [u8; 4] = *b"HM3W";

/// Size of the version 0 header
pub const HEADER_SIZE: u32 = 32;
/// Headers are only searched for at multiples of this
pub const HEADER_ALIGNMENT: u64 = 0x200;
/// Size of one hash or block table entry
pub const TABLE_ENTRY_SIZE: u64 = 16;

/// Block flag bits
pub mod flags {
    /// PKWARE implode
    pub const IMPLODE: u32 = 0x0000_0100;
    /// Per-sector compression with a mask byte
    pub const COMPRESS: u32 = 0x0000_0200;
    /// Encrypted with the name-derived key
    pub const ENCRYPTED: u32 = 0x0001_0000;
    /// Key adjusted by offset and size
    pub const FIX_KEY: u32 = 0x0002_0000;
    /// Stored as one unit instead of sectors
    pub const SINGLE_UNIT: u32 = 0x0100_0000;
    /// Sector checksums follow the offset table
    pub const SECTOR_CRC: u32 = 0x0400_0000;
    /// Entry is in use
    pub const EXISTS: u32 = 0x8000_0000;
}

/// Sector compression mask for zlib
pub const MASK_ZLIB: u8 = 0x02;

/// Archive header (format versions 0 and 1)
///
/// All fields are little-endian. Offsets are relative to the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"MPQ\x1A")]
pub struct MpqHeader {
    /// Size of the header in bytes
    pub header_size: u32,
    /// Size of the archive in bytes
    pub archive_size: u32,
    /// Format version
    pub format_version: u16,
    /// Sector size as `512 << shift`
    pub sector_size_shift: u16,
    /// Offset of the hash table
    pub hash_table_offset: u32,
    /// Offset of the block table
    pub block_table_offset: u32,
    /// Hash table entry count, a power of two
    pub hash_table_entries: u32,
    /// Block table entry count
    pub block_table_entries: u32,
}

impl MpqHeader {
    /// Sector size in bytes
    pub fn sector_size(&self) -> u64 {
        512u64 << self.sector_size_shift.min(31)
    }

    /// Check the fields that can be validated without the tables
    pub fn is_plausible(&self) -> bool {
        self.header_size >= HEADER_SIZE
            && self.format_version <= 1
            && self.sector_size_shift <= 15
            && self.hash_table_entries.is_power_of_two()
    }
}

/// Header that places the archive further into the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"MPQ\x1B")]
pub struct UserDataHeader {
    /// Space reserved for user data
    pub user_data_size: u32,
    /// Offset of the archive header relative to this header
    pub header_offset: u32,
    /// Size of this header
    pub user_data_header_size: u32,
}

/// Hash table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct HashEntry {
    /// First name check hash
    pub name_a: u32,
    /// Second name check hash
    pub name_b: u32,
    /// Windows LANGID
    pub locale: u16,
    /// Platform, always 0
    pub platform: u16,
    /// Index into the block table, or one of the markers
    pub block_index: u32,
}

impl HashEntry {
    /// Slot never used; ends a probe sequence
    pub const EMPTY: u32 = 0xFFFF_FFFF;
    /// Slot freed; probing continues past it
    pub const DELETED: u32 = 0xFFFF_FFFE;

    /// An unused slot
    pub const fn empty() -> Self {
        Self {
            name_a: 0xFFFF_FFFF,
            name_b: 0xFFFF_FFFF,
            locale: 0xFFFF,
            platform: 0xFFFF,
            block_index: Self::EMPTY,
        }
    }

    /// Whether the slot was never used
    pub fn is_empty(&self) -> bool {
        self.block_index == Self::EMPTY
    }
}

/// Block table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct BlockEntry {
    /// Offset of the data, relative to the header
    pub file_pos: u32,
    /// Stored size
    pub compressed_size: u32,
    /// Decoded size
    pub file_size: u32,
    /// [`flags`] bits
    pub flags: u32,
}

impl BlockEntry {
    /// Whether `flag` is set
    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Names of the [`flags`] set in `value`
pub fn describe_flags(value: u32) -> String {
    const NAMES: [(u32, &str); 7] = [
        (flags::EXISTS, "exists"),
        (flags::COMPRESS, "compressed"),
        (flags::IMPLODE, "imploded"),
        (flags::ENCRYPTED, "encrypted"),
        (flags::FIX_KEY, "fix-key"),
        (flags::SINGLE_UNIT, "single-unit"),
        (flags::SECTOR_CRC, "sector-crc"),
    ];
    NAMES
        .iter()
        .filter(|(bit, _)| value & bit != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn test_header_layout() {
        let header = MpqHeader {
            header_size: HEADER_SIZE,
            archive_size: 0x1000,
            format_version: 0,
            sector_size_shift: 3,
            hash_table_offset: 0x800,
            block_table_offset: 0x900,
            hash_table_entries: 16,
            block_table_entries: 2,
        };
        let mut cursor = Cursor::new(Vec::new());
        header.write(&mut cursor).unwrap();
        let bytes = cursor.into_inner();

        assert_eq!(bytes.len(), HEADER_SIZE as usize);
        assert_eq!(&bytes[..4], &MPQ_MAGIC);
        assert_eq!(&bytes[14..16], &[3, 0]);
        assert_eq!(header.sector_size(), 4096);
        assert!(header.is_plausible());
        assert_eq!(MpqHeader::read(&mut Cursor::new(&bytes)).unwrap(), header);
    }

    #[test]
    fn test_implausible_headers() {
        let mut header = MpqHeader {
            header_size: HEADER_SIZE,
            archive_size: 0,
            format_version: 0,
            sector_size_shift: 3,
            hash_table_offset: 0,
            block_table_offset: 0,
            hash_table_entries: 12,
            block_table_entries: 0,
        };
        assert!(!header.is_plausible());
        header.hash_table_entries = 16;
        header.format_version = 3;
        assert!(!header.is_plausible());
    }

    #[test]
    fn test_describe_flags() {
        assert_eq!(
            describe_flags(flags::EXISTS | flags::COMPRESS | flags::ENCRYPTED),
            "exists,compressed,encrypted"
        );
        assert_eq!(describe_flags(0), "");
    }
}
