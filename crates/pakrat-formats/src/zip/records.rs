//! ZIP record layouts (APPNOTE 4.3)

use binrw::{BinRead, BinWrite};

/// Local file header signature
pub const LOCAL_SIGNATURE: [u8; 4] = *b"PK\x03\x04";
/// Central directory header signature
pub const CENTRAL_SIGNATURE: [u8; 4] = *b"PK\x01\x02";
/// End of central directory signature
pub const END_SIGNATURE: [u8; 4] = *b"PK\x05\x06";

/// Fixed part of a local header
pub const LOCAL_HEADER_SIZE: u64 = 30;
/// Fixed part of the end of central directory record
pub const END_RECORD_SIZE: u64 = 22;

/// Method code for stored entries
pub const METHOD_STORED: u16 = 0;
/// Method code for deflated entries
pub const METHOD_DEFLATE: u16 = 8;

/// Entry is encrypted
pub const FLAG_ENCRYPTED: u16 = 0x0001;
/// Sizes and CRC follow the data
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
/// Name is UTF-8
pub const FLAG_UTF8: u16 = 0x0800;

/// Local file header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"PK\x03\x04")]
pub struct LocalHeader {
    /// Version needed to extract
    pub version: u16,
    /// General purpose flags
    pub flags: u16,
    /// Compression method
    pub method: u16,
    /// DOS time
    pub time: u16,
    /// DOS date
    pub date: u16,
    /// CRC-32 of the decoded data
    pub crc32: u32,
    /// Stored size
    pub compressed_size: u32,
    /// Decoded size
    pub uncompressed_size: u32,
    /// Name length
    pub name_len: u16,
    /// Extra field length
    pub extra_len: u16,
}

impl LocalHeader {
    /// Offset of the entry data relative to the header
    pub fn data_offset(&self) -> u64 {
        LOCAL_HEADER_SIZE + u64::from(self.name_len) + u64::from(self.extra_len)
    }
}

/// Central directory header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"PK\x01\x02")]
pub struct CentralHeader {
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version: u16,
    /// General purpose flags
    pub flags: u16,
    /// Compression method
    pub method: u16,
    /// DOS time
    pub time: u16,
    /// DOS date
    pub date: u16,
    /// CRC-32 of the decoded data
    pub crc32: u32,
    /// Stored size
    pub compressed_size: u32,
    /// Decoded size
    pub uncompressed_size: u32,
    /// Name length
    pub name_len: u16,
    /// Extra field length
    pub extra_len: u16,
    /// Comment length
    pub comment_len: u16,
    /// Disk holding the local header
    pub disk_start: u16,
    /// Internal attributes
    pub internal_attributes: u16,
    /// External attributes
    pub external_attributes: u32,
    /// Offset of the local header
    pub local_offset: u32,
    /// Entry name
    #[br(count = name_len)]
    pub name: Vec<u8>,
    /// Extra field
    #[br(count = extra_len)]
    pub extra: Vec<u8>,
    /// Entry comment
    #[br(count = comment_len)]
    pub comment: Vec<u8>,
}

impl CentralHeader {
    /// Name as text, with invalid UTF-8 replaced
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// Whether the entry is a directory marker
    pub fn is_directory(&self) -> bool {
        self.name.last() == Some(&b'/') && self.uncompressed_size == 0
    }
}

/// End of central directory record
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"PK\x05\x06")]
pub struct EndRecord {
    /// Number of this disk
    pub disk: u16,
    /// Disk holding the central directory
    pub directory_disk: u16,
    /// Entries on this disk
    pub disk_entries: u16,
    /// Total entries
    pub entries: u16,
    /// Central directory size
    pub directory_size: u32,
    /// Central directory offset
    pub directory_offset: u32,
    /// Comment length
    pub comment_len: u16,
}

/// Offset of the end record within `tail`, searching backwards
pub fn find_end_record(tail: &[u8]) -> Option<usize> {
    let last = tail.len().checked_sub(END_RECORD_SIZE as usize)?;
    (0..=last)
        .rev()
        .find(|&i| tail[i..].starts_with(&END_SIGNATURE))
}
