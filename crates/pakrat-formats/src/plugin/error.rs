//! Error types for plugin operations

use crate::inflate::InflateError;
use pakrat_crypto::CryptoError;
use thiserror::Error;

/// Plugin operation result type
pub type PluginResult<T> = Result<T, PluginError>;

/// Failures a plugin reports while reading, decoding or writing a container
///
/// "Not this format" is not an error: detection signals it with
/// [`super::Rating::NONE`].
#[derive(Debug, Error)]
pub enum PluginError {
    /// The container is structurally invalid
    #[error("malformed container: {reason}")]
    Malformed {
        /// What was wrong
        reason: String,
    },

    /// A resource points outside the container
    #[error("resource {name} ({offset}+{length}) exceeds container of {container_len} bytes")]
    OutOfBounds {
        /// Resource name
        name: String,
        /// Stored offset
        offset: u64,
        /// Stored length
        length: u64,
        /// Container size
        container_len: u64,
    },

    /// The container uses a feature this plugin does not implement
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Writing needs decoded bytes that were never loaded
    #[error("resource {0} has no data loaded")]
    MissingData(String),

    /// Decoded data failed an integrity check
    #[error("checksum mismatch for {name}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Resource name
        name: String,
        /// Stored checksum
        expected: u32,
        /// Computed checksum
        actual: u32,
    },

    /// Decoded data would exceed the configured limit
    #[error("resource {name} decodes to {size} bytes, limit is {limit}")]
    TooLarge {
        /// Resource name
        name: String,
        /// Declared size
        size: u64,
        /// Configured limit
        limit: u64,
    },

    /// No plugin recognises the container
    #[error("no plugin recognises {0}")]
    Unrecognized(String),

    /// A resource index is out of range
    #[error("no resource at index {index} (archive has {len})")]
    NoSuchResource {
        /// Requested index
        index: usize,
        /// Number of resources
        len: usize,
    },

    /// No plugin has the requested code
    #[error("no plugin registered for {0}")]
    UnknownPlugin(String),

    /// A session operation needs an open archive
    #[error("no archive is open")]
    NoArchiveOpen,

    /// The plugin cannot write containers
    #[error("plugin {0} cannot write containers")]
    ReadOnly(String),

    /// Cryptographic primitive failure
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Compressed data is invalid
    #[error("decompression failed: {0}")]
    Inflate(#[from] InflateError),

    /// Binary read/write error
    #[error("binary format error: {0}")]
    BinRead(#[from] binrw::Error),

    /// I/O error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// Build a [`PluginError::Malformed`]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Whether the container itself is at fault
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::Malformed { .. }
            | Self::OutOfBounds { .. }
            | Self::ChecksumMismatch { .. }
            | Self::Inflate(_) => true,
            Self::BinRead(err) => !matches!(err, binrw::Error::Io(_)),
            _ => false,
        }
    }

    /// Whether the underlying stream failed
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BinRead(binrw::Error::Io(_)))
    }
}
