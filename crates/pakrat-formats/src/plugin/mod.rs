//! Archive plugin contract
//!
//! Every supported container format implements [`ArchivePlugin`]. A plugin
//! is a stateless strategy object: it owns no [`Resource`] or
//! [`Archive`](crate::archive::Archive) state, only its immutable
//! configuration, so one instance can serve any number of containers.
//!
//! # Failure model
//!
//! - Detection never fails. [`ArchivePlugin::rate`] returns
//!   [`Rating::NONE`] for "not this format".
//! - Reading never aborts the process. [`ArchivePlugin::read`] returns a
//!   [`ReadReport`]. An entry that fails its own checks is skipped with
//!   [`ReadReport::skip`] and enumeration goes on; only an unreadable
//!   directory stops it, keeping everything enumerated before.
//! - Decoding and writing return [`PluginResult`].

pub mod column;
mod error;
mod registry;

pub use column::{Column, generic_columns, generic_value};
pub use error::{PluginError, PluginResult};
pub use registry::PluginRegistry;

use crate::resource::Resource;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::ops::{Add, AddAssign};
use std::path::Path;
use tracing::warn;

/// Number of leading bytes captured for detection
pub const PROBE_LEN: usize = 64;

/// A seekable byte source
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// What detection gets to look at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probe {
    /// Lower-case file extension, if known
    pub extension: Option<String>,
    /// Container length in bytes
    pub len: u64,
    /// First bytes of the container (up to [`PROBE_LEN`])
    pub head: Vec<u8>,
}

impl Probe {
    /// Capture a probe from a seekable source; the position is restored to 0
    pub fn from_reader(source: &mut dyn ReadSeek, name: Option<&Path>) -> io::Result<Self> {
        let len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        let mut head = Vec::with_capacity(PROBE_LEN);
        (&mut *source)
            .take(PROBE_LEN as u64)
            .read_to_end(&mut head)?;
        source.seek(SeekFrom::Start(0))?;

        let extension = name
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        Ok(Self {
            extension,
            len,
            head,
        })
    }

    /// Probe over an in-memory container
    pub fn from_bytes(data: &[u8], extension: Option<&str>) -> Self {
        Self {
            extension: extension.map(str::to_ascii_lowercase),
            len: data.len() as u64,
            head: data[..data.len().min(PROBE_LEN)].to_vec(),
        }
    }

    /// Whether the container starts with `magic`
    pub fn starts_with(&self, magic: &[u8]) -> bool {
        self.head.starts_with(magic)
    }

    /// Whether the extension is one of `extensions`
    pub fn has_extension(&self, extensions: &[&str]) -> bool {
        self.extension
            .as_deref()
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// Detection confidence; higher is better
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(pub u8);

impl Rating {
    /// Not this format
    pub const NONE: Self = Self(0);
    /// The file extension matches
    pub const EXTENSION: Self = Self(25);
    /// The signature matches
    pub const SIGNATURE: Self = Self(50);
    /// The directory structure was verified
    pub const STRUCTURE: Self = Self(25);

    /// Whether the plugin claims the container
    pub fn is_match(self) -> bool {
        self.0 > 0
    }
}

impl Add for Rating {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Rating {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Static description of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginInfo {
    /// Short unique code, used on the command line
    pub code: &'static str,
    /// Display name
    pub name: &'static str,
    /// Typical file extensions, lower-case, without dots
    pub extensions: &'static [&'static str],
    /// Whether [`ArchivePlugin::write`] is implemented
    pub can_write: bool,
}

/// Outcome of enumerating a container
///
/// `resources` holds every entry that was read. `failure` is the first
/// problem met: either a skipped entry or the error that stopped the
/// plugin.
#[derive(Debug, Default)]
pub struct ReadReport {
    /// Entries in container order
    pub resources: Vec<Resource>,
    /// First entry-level or directory-level failure
    pub failure: Option<PluginError>,
    /// Number of entries left out because they failed their checks
    pub skipped: usize,
}

impl ReadReport {
    /// Run `read`, keeping whatever it gathered if it fails
    pub fn collect<F>(read: F) -> Self
    where
        F: FnOnce(&mut Self) -> PluginResult<()>,
    {
        let mut report = Self::default();
        if let Err(error) = read(&mut report) {
            report.record(error);
        }
        report
    }

    /// A report with no entries and a failure
    pub fn failed(error: PluginError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Add an entry
    pub fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Leave one entry out, remembering why
    pub fn skip(&mut self, error: PluginError) {
        warn!(%error, "skipping entry");
        self.skipped += 1;
        self.record(error);
    }

    /// Add `resource` if it lies inside the container, otherwise skip it
    pub fn push_checked(&mut self, resource: Resource, container_len: u64) {
        match check_bounds(&resource, container_len) {
            Ok(()) => self.push(resource),
            Err(error) => self.skip(error),
        }
    }

    fn record(&mut self, error: PluginError) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    /// Whether the whole container was read
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// The resources, or the first failure if there was one
    pub fn into_result(self) -> PluginResult<Vec<Resource>> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self.resources),
        }
    }
}

/// One container format
pub trait ArchivePlugin: Send + Sync {
    /// Static description
    fn info(&self) -> &PluginInfo;

    /// Rate how likely the probed container is in this format
    fn rate(&self, probe: &Probe) -> Rating;

    /// Enumerate the container's entries
    fn read(&self, source: &mut dyn ReadSeek) -> ReadReport;

    /// Decode one entry
    fn extract(&self, resource: &Resource, source: &mut dyn ReadSeek) -> PluginResult<Vec<u8>>;

    /// Serialize `resources` as a new container
    ///
    /// Every resource must have its decoded bytes loaded. Offsets and lengths
    /// are rewritten to describe the new container.
    fn write(&self, resources: &mut [Resource], out: &mut dyn Write) -> PluginResult<()> {
        let _ = (resources, out);
        Err(PluginError::ReadOnly(self.info().code.to_string()))
    }

    /// Columns this plugin can describe, in display order
    fn columns(&self) -> Vec<Column> {
        generic_columns()
    }

    /// Display value of `column` for `resource`
    fn column_value(&self, resource: &Resource, column: char) -> Option<String> {
        generic_value(resource, column)
    }
}

/// Read `length` bytes at `offset`
pub fn read_range(source: &mut dyn ReadSeek, offset: u64, length: u64) -> PluginResult<Vec<u8>> {
    let length = usize::try_from(length)
        .map_err(|_| PluginError::malformed(format!("length {length} too large for platform")))?;
    source.seek(SeekFrom::Start(offset))?;
    let mut data = vec![0u8; length];
    source.read_exact(&mut data)?;
    Ok(data)
}

/// Fail unless `resource` lies inside a container of `container_len` bytes
pub fn check_bounds(resource: &Resource, container_len: u64) -> PluginResult<()> {
    if resource.fits_within(container_len) {
        Ok(())
    } else {
        Err(PluginError::OutOfBounds {
            name: resource.name.clone(),
            offset: resource.offset,
            length: resource.compressed_length,
            container_len,
        })
    }
}

/// Decoded bytes of a resource about to be written
pub fn loaded_data(resource: &Resource) -> PluginResult<&[u8]> {
    resource
        .data()
        .ok_or_else(|| PluginError::MissingData(resource.name.clone()))
}
