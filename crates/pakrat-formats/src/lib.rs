//! Archive plugin contract and container formats
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Format names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // name_a / name_b and friends
#![allow(clippy::needless_pass_by_value)] // Configuration types
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! A game data container is opened by rating every registered
//! [`ArchivePlugin`](plugin::ArchivePlugin) against the first bytes of the
//! file, letting the best one enumerate its entries as
//! [`Resource`](resource::Resource) values, and decoding entries on demand.
//!
//! # Supported Formats
//!
//! - **MPQ**: Blizzard archives with encrypted hash and block tables
//! - **PAK**: Quake "PACK" files
//! - **ZIP**: Stored and deflated entries
//!
//! # Example
//!
//! ```rust,no_run
//! use pakrat_formats::archive::Session;
//! use pakrat_formats::config::ExtractorConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(ExtractorConfig::default());
//! let archive = session.open(Path::new("war3.mpq"))?;
//! for resource in archive.resources() {
//!     println!("{} ({} bytes)", resource.name, resource.decompressed_length);
//! }
//! let first = session.extract(0)?;
//! # let _ = first;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Opened containers and the session that holds the current one
pub mod archive;
/// Extraction and writing settings
pub mod config;
/// Raw deflate and zlib decoding over canonical Huffman tables
pub mod inflate;
pub mod mpq;
pub mod pak;
pub mod plugin;
pub mod resource;
pub mod zip;

pub use archive::{Archive, Session};
pub use config::ExtractorConfig;
pub use plugin::{ArchivePlugin, PluginError, PluginRegistry, PluginResult};
pub use resource::{CompressionMethod, Resource};
