//! Uniform record for one file inside an opened container
//!
//! Plugins create [`Resource`] values while enumerating a container. After
//! that, consumers only ever see this type: renamers change the name,
//! re-writers recompute offsets and lengths, and nothing outside the plugin
//! touches format-specific bytes.

use pakrat_crypto::fnv::{Fnv1a64, FnvHasher};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the stored bytes of a resource are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "method", content = "value", rename_all = "snake_case")]
pub enum CompressionMethod {
    /// Stored as-is
    #[default]
    None,
    /// Raw deflate stream
    Deflate,
    /// zlib-wrapped deflate stream
    Zlib,
    /// Per-sector compression; the mask names the codecs applied, or is 0
    /// when it varies between sectors
    Multi(u8),
    /// A format-specific method this crate cannot decode
    Unknown(u16),
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Deflate => f.write_str("deflate"),
            Self::Zlib => f.write_str("zlib"),
            Self::Multi(0) => f.write_str("multi"),
            Self::Multi(mask) => write!(f, "multi:{mask:02x}"),
            Self::Unknown(code) => write!(f, "unknown:{code}"),
        }
    }
}

/// Insertion-ordered format metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(Vec<(String, String)>);

impl Properties {
    /// Empty property list
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the value under `key`, or append it if the key is new
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One logical file inside a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Path inside the container
    pub name: String,
    /// Byte offset of the stored data in the container
    pub offset: u64,
    /// Stored size in bytes
    pub compressed_length: u64,
    /// Size once decoded
    pub decompressed_length: u64,
    /// Encoding of the stored bytes
    pub compression: CompressionMethod,
    /// Format-specific metadata
    pub properties: Properties,
    /// Decoded bytes, when loaded or supplied for writing
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
}

impl Resource {
    /// Resource stored without compression
    pub fn new(name: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            name: name.into(),
            offset,
            compressed_length: length,
            decompressed_length: length,
            compression: CompressionMethod::None,
            properties: Properties::new(),
            data: None,
        }
    }

    /// Resource built from in-memory bytes, ready to be written
    pub fn from_data(name: impl Into<String>, data: Vec<u8>) -> Self {
        let length = data.len() as u64;
        Self {
            data: Some(data),
            ..Self::new(name, 0, length)
        }
    }

    /// Set stored and decoded sizes
    #[must_use]
    pub fn with_lengths(mut self, compressed: u64, decompressed: u64) -> Self {
        self.compressed_length = compressed;
        self.decompressed_length = decompressed;
        self
    }

    /// Set the compression method
    #[must_use]
    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    /// Add a property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }

    /// Rename the resource; nothing else changes
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Value of a property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// Set a property, keeping its position if it already exists
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.set(key, value);
    }

    /// Whether the stored bytes need decoding
    pub fn is_compressed(&self) -> bool {
        self.compression != CompressionMethod::None
    }

    /// Lower-case extension of the final path component, without the dot
    pub fn extension(&self) -> Option<String> {
        let base = self.name.rsplit(['/', '\\']).next()?;
        let (stem, ext) = base.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Case- and separator-insensitive FNV-1a hash of the name
    pub fn name_hash(&self) -> u64 {
        name_hash(&self.name)
    }

    /// One past the last stored byte
    pub fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.compressed_length)
    }

    /// Whether the stored range fits inside a container of `container_len`
    pub fn fits_within(&self, container_len: u64) -> bool {
        self.offset
            .checked_add(self.compressed_length)
            .is_some_and(|end| end <= container_len)
    }

    /// Cached decoded bytes
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Drop cached decoded bytes
    pub fn clear_data(&mut self) {
        self.data = None;
    }
}

/// Hash used to index resources by name
pub fn name_hash(name: &str) -> u64 {
    let mut hasher = Fnv1a64::default();
    for byte in name.bytes() {
        let byte = match byte {
            b'\\' => b'/',
            other => other.to_ascii_lowercase(),
        };
        hasher.update(&[byte]);
    }
    hasher.hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rename_only_touches_name() {
        let mut resource = Resource::new("data/a.bin", 128, 64)
            .with_lengths(64, 256)
            .with_compression(CompressionMethod::Zlib)
            .with_property("Flags", "0x80000200");
        let before = resource.clone();

        resource.rename("data/renamed.bin");

        assert_eq!(resource.name, "data/renamed.bin");
        assert_eq!(resource.offset, before.offset);
        assert_eq!(resource.compressed_length, before.compressed_length);
        assert_eq!(resource.decompressed_length, before.decompressed_length);
        assert_eq!(resource.properties, before.properties);
    }

    #[test]
    fn test_properties_keep_order() {
        let mut props = Properties::new();
        props.set("b", "1");
        props.set("a", "2");
        props.set("b", "3");

        let collected: Vec<_> = props.iter().collect();
        assert_eq!(collected, vec![("b", "3"), ("a", "2")]);
        assert_eq!(props.remove("b"), Some("3".to_string()));
        assert_eq!(props.get("b"), None);
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_extension() {
        assert_eq!(Resource::new("a/b/Model.MDX", 0, 0).extension(), Some("mdx".into()));
        assert_eq!(Resource::new("dir.d\\noext", 0, 0).extension(), None);
        assert_eq!(Resource::new(".hidden", 0, 0).extension(), None);
    }

    #[test]
    fn test_bounds() {
        let resource = Resource::new("x", 100, 50);
        assert!(resource.fits_within(150));
        assert!(!resource.fits_within(149));
        assert!(!Resource::new("y", u64::MAX, 2).fits_within(u64::MAX));
        assert_eq!(resource.end_offset(), 150);
    }

    #[test]
    fn test_name_hash_normalizes() {
        assert_eq!(name_hash("Units\\Human\\Footman.mdx"), name_hash("units/human/footman.mdx"));
        assert_ne!(name_hash("a.txt"), name_hash("b.txt"));
        assert_eq!(name_hash(""), Fnv1a64::digest(b""));
    }

    #[test]
    fn test_from_data() {
        let resource = Resource::from_data("readme.txt", b"hello".to_vec());
        assert_eq!(resource.compressed_length, 5);
        assert_eq!(resource.decompressed_length, 5);
        assert_eq!(resource.data(), Some(&b"hello"[..]));
        assert!(!resource.is_compressed());
    }

    #[test]
    fn test_compression_display() {
        assert_eq!(CompressionMethod::Multi(0x02).to_string(), "multi:02");
        assert_eq!(CompressionMethod::Multi(0).to_string(), "multi");
        assert_eq!(CompressionMethod::Deflate.to_string(), "deflate");
    }
}
