//! Configuration shared by the built-in plugins

use serde::{Deserialize, Serialize};

/// Configuration for opening and writing containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Largest decoded resource accepted, in bytes
    pub max_resource_size: u64,

    /// Check stored CRC-32 values while extracting
    pub verify_checksums: bool,

    /// MPQ plugin settings
    pub mpq: MpqConfig,

    /// ZIP plugin settings
    pub zip: ZipConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_resource_size: 1024 * 1024 * 1024, // 1 GiB
            verify_checksums: true,
            mpq: MpqConfig::default(),
            zip: ZipConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Set the decoded size limit
    #[must_use]
    pub const fn with_max_resource_size(mut self, size: u64) -> Self {
        self.max_resource_size = size;
        self
    }

    /// Enable or disable checksum verification
    #[must_use]
    pub const fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Replace the MPQ settings
    #[must_use]
    pub fn with_mpq(mut self, mpq: MpqConfig) -> Self {
        self.mpq = mpq;
        self
    }

    /// Replace the ZIP settings
    #[must_use]
    pub const fn with_zip(mut self, zip: ZipConfig) -> Self {
        self.zip = zip;
        self
    }

    /// Size limit as a `usize`, clamped on 32-bit targets
    pub fn output_limit(&self) -> usize {
        usize::try_from(self.max_resource_size).unwrap_or(usize::MAX)
    }
}

/// MPQ plugin settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpqConfig {
    /// Names tried against the hash table in addition to `(listfile)`
    pub extra_names: Vec<String>,

    /// Sector size written to new archives, as `512 << shift`
    pub sector_size_shift: u16,

    /// Encrypt entries when writing
    pub encrypt_on_write: bool,

    /// zlib-compress sectors when writing
    pub compress_on_write: bool,
}

impl Default for MpqConfig {
    fn default() -> Self {
        Self {
            extra_names: Vec::new(),
            sector_size_shift: 3, // 4 KiB sectors
            encrypt_on_write: false,
            compress_on_write: true,
        }
    }
}

impl MpqConfig {
    /// Add a name to try against the hash table
    #[must_use]
    pub fn with_extra_name(mut self, name: impl Into<String>) -> Self {
        self.extra_names.push(name.into());
        self
    }

    /// Set the sector size shift
    #[must_use]
    pub const fn with_sector_size_shift(mut self, shift: u16) -> Self {
        self.sector_size_shift = shift;
        self
    }

    /// Enable or disable encryption on write
    #[must_use]
    pub const fn with_encryption(mut self, encrypt: bool) -> Self {
        self.encrypt_on_write = encrypt;
        self
    }

    /// Enable or disable compression on write
    #[must_use]
    pub const fn with_compression(mut self, compress: bool) -> Self {
        self.compress_on_write = compress;
        self
    }

    /// Sector size in bytes; shifts above 15 are clamped
    pub fn sector_size(&self) -> u32 {
        512u32 << self.sector_size_shift.min(15)
    }
}

/// ZIP plugin settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZipConfig {
    /// Deflate entries when writing
    pub compress_on_write: bool,
}

impl Default for ZipConfig {
    fn default() -> Self {
        Self {
            compress_on_write: true,
        }
    }
}
