//! Quake "PACK" containers
//!
//! A 12-byte header points at a flat directory of 64-byte entries. Data is
//! stored uncompressed, so extraction is a bounded range read.

mod entry;

pub use entry::{ENTRY_SIZE, HEADER_SIZE, NAME_LEN, PAK_MAGIC, PakEntry, PakHeader};

use crate::config::ExtractorConfig;
use crate::plugin::{
    ArchivePlugin, PluginError, PluginInfo, PluginResult, Probe, Rating, ReadReport, ReadSeek,
    loaded_data, read_range,
};
use crate::resource::Resource;
use binrw::{BinRead, BinWrite};
use binrw::io::Cursor;
use std::io::{SeekFrom, Write};
use tracing::debug;

const INFO: PluginInfo = PluginInfo {
    code: "pak",
    name: "Quake PACK",
    extensions: &["pak"],
    can_write: true,
};

/// Plugin for Quake PACK files
#[derive(Debug, Clone, Default)]
pub struct PakPlugin {
    config: ExtractorConfig,
}

impl PakPlugin {
    /// Create the plugin
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn read_entries(source: &mut dyn ReadSeek, report: &mut ReadReport) -> PluginResult<()> {
        let container_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        let header = PakHeader::read(&mut &mut *source)?;
        let count = header.entry_count().ok_or_else(|| {
            PluginError::malformed(format!(
                "directory length {} is not a multiple of {ENTRY_SIZE}",
                header.dir_length
            ))
        })?;
        if !header.fits_within(container_len) {
            return Err(PluginError::malformed(format!(
                "directory at {} ({} bytes) outside {container_len}-byte container",
                header.dir_offset, header.dir_length
            )));
        }

        source.seek(SeekFrom::Start(u64::from(header.dir_offset)))?;
        for _ in 0..count {
            let entry = PakEntry::read(&mut &mut *source)?;
            let resource = Resource::new(entry.name(), u64::from(entry.offset), u64::from(entry.size));
            debug!(name = %resource.name, offset = resource.offset, "pak entry");
            report.push_checked(resource, container_len);
        }
        Ok(())
    }
}

impl ArchivePlugin for PakPlugin {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn rate(&self, probe: &Probe) -> Rating {
        let mut rating = Rating::NONE;
        if probe.has_extension(INFO.extensions) {
            rating += Rating::EXTENSION;
        }
        if probe.starts_with(&PAK_MAGIC) {
            rating += Rating::SIGNATURE;
            let header = PakHeader::read(&mut Cursor::new(&probe.head)).ok();
            if header.is_some_and(|h| h.entry_count().is_some() && h.fits_within(probe.len)) {
                rating += Rating::STRUCTURE;
            }
        }
        rating
    }

    fn read(&self, source: &mut dyn ReadSeek) -> ReadReport {
        ReadReport::collect(|report| Self::read_entries(source, report))
    }

    fn extract(&self, resource: &Resource, source: &mut dyn ReadSeek) -> PluginResult<Vec<u8>> {
        if resource.compressed_length > self.config.max_resource_size {
            return Err(PluginError::TooLarge {
                name: resource.name.clone(),
                size: resource.compressed_length,
                limit: self.config.max_resource_size,
            });
        }
        read_range(source, resource.offset, resource.compressed_length)
    }

    fn write(&self, resources: &mut [Resource], out: &mut dyn Write) -> PluginResult<()> {
        let mut body = Vec::new();
        let mut directory = Cursor::new(Vec::new());

        for resource in resources.iter_mut() {
            let data = loaded_data(resource)?;
            let offset = HEADER_SIZE + body.len() as u64;
            let (offset32, size32) = match (u32::try_from(offset), u32::try_from(data.len())) {
                (Ok(o), Ok(s)) => (o, s),
                _ => return Err(PluginError::Unsupported("PACK files are limited to 4 GiB".into())),
            };
            let entry = PakEntry::new(&resource.name, offset32, size32).ok_or_else(|| {
                PluginError::Unsupported(format!(
                    "name '{}' does not fit a {NAME_LEN}-byte PACK entry",
                    resource.name
                ))
            })?;
            entry.write(&mut directory)?;
            body.extend_from_slice(data);

            resource.offset = offset;
            resource.compressed_length = u64::from(size32);
            resource.decompressed_length = u64::from(size32);
        }

        let dir_offset = u32::try_from(HEADER_SIZE + body.len() as u64)
            .map_err(|_| PluginError::Unsupported("PACK files are limited to 4 GiB".into()))?;
        let mut header = Cursor::new(Vec::new());
        PakHeader::new(dir_offset, resources.len() as u32).write(&mut header)?;

        out.write_all(header.get_ref())?;
        out.write_all(&body)?;
        out.write_all(directory.get_ref())?;
        Ok(())
    }
}
