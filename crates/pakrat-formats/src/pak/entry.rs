//! PACK header and directory entries

use binrw::{BinRead, BinWrite};

/// Header magic
pub const PAK_MAGIC: [u8; 4] = *b"PACK";
/// Header size in bytes
pub const HEADER_SIZE: u64 = 12;
/// Directory entry size in bytes
pub const ENTRY_SIZE: u64 = 64;
/// Name field width, including the terminating NUL
pub const NAME_LEN: usize = 56;

/// File header
///
/// - Magic "PACK" (4 bytes)
/// - Directory offset (4 bytes, little-endian)
/// - Directory length in bytes (4 bytes, little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct PakHeader {
    /// Always "PACK"
    #[br(assert(magic == PAK_MAGIC, "invalid PACK magic: {:?}", magic))]
    pub magic: [u8; 4],

    /// Offset of the directory
    pub dir_offset: u32,

    /// Size of the directory in bytes
    pub dir_length: u32,
}

impl PakHeader {
    /// Header for a directory at `dir_offset` holding `entries` entries
    pub fn new(dir_offset: u32, entries: u32) -> Self {
        Self {
            magic: PAK_MAGIC,
            dir_offset,
            dir_length: entries.saturating_mul(ENTRY_SIZE as u32),
        }
    }

    /// Number of directory entries, if the directory length is a whole
    /// number of entries
    pub fn entry_count(&self) -> Option<u64> {
        let length = u64::from(self.dir_length);
        (length % ENTRY_SIZE == 0).then_some(length / ENTRY_SIZE)
    }

    /// Whether the directory lies inside a container of `len` bytes
    pub fn fits_within(&self, len: u64) -> bool {
        u64::from(self.dir_offset) >= HEADER_SIZE
            && u64::from(self.dir_offset) + u64::from(self.dir_length) <= len
    }
}

/// One directory entry
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct PakEntry {
    /// NUL-padded name
    pub name: [u8; NAME_LEN],

    /// Offset of the file data
    pub offset: u32,

    /// Size of the file data
    pub size: u32,
}

impl PakEntry {
    /// Entry for `name`; `None` if the name does not fit the field
    pub fn new(name: &str, offset: u32, size: u32) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() >= NAME_LEN || bytes.contains(&0) {
            return None;
        }
        let mut field = [0u8; NAME_LEN];
        field[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            name: field,
            offset,
            size,
        })
    }

    /// Name up to the first NUL
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}
