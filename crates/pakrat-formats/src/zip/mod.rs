//! ZIP containers
//!
//! Entries are enumerated from the central directory; each local header is
//! read once to find where the data starts. Stored and deflated entries
//! decode through [`crate::inflate`]. ZIP64, spanning and encryption are
//! reported as unsupported.

mod records;

pub use records::{
    CENTRAL_SIGNATURE, CentralHeader, EndRecord, LocalHeader, METHOD_DEFLATE, METHOD_STORED,
    find_end_record,
};

use crate::config::ExtractorConfig;
use crate::inflate;
use crate::plugin::column::Column;
use crate::plugin::{
    ArchivePlugin, PluginError, PluginInfo, PluginResult, Probe, Rating, ReadReport, ReadSeek,
    generic_columns, generic_value, loaded_data, read_range,
};
use crate::resource::{CompressionMethod, Resource};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use records::{
    END_RECORD_SIZE, END_SIGNATURE, FLAG_DATA_DESCRIPTOR, FLAG_ENCRYPTED, FLAG_UTF8,
    LOCAL_HEADER_SIZE, LOCAL_SIGNATURE,
};
use std::io::{SeekFrom, Write};
use tracing::{debug, warn};

const INFO: PluginInfo = PluginInfo {
    code: "zip",
    name: "ZIP",
    extensions: &["zip", "pk3", "pk4"],
    can_write: true,
};

/// Property holding the stored CRC-32 as hex
pub const PROP_CRC32: &str = "CRC32";
/// Property holding the general purpose flags
pub const PROP_FLAGS: &str = "Flags";

/// CRC-32 column
pub const CRC_COLUMN: Column = Column::new('K', "CRC-32");
/// Flags column
pub const FLAGS_COLUMN: Column = Column::new('F', "Flags");

/// Largest trailing comment plus the end record
const MAX_TAIL: u64 = END_RECORD_SIZE + 0xFFFF;

// 1980-01-01 00:00
const DOS_DATE: u16 = 0x0021;
const VERSION: u16 = 20;

/// Plugin for ZIP files
#[derive(Debug, Clone, Default)]
pub struct ZipPlugin {
    config: ExtractorConfig,
}

impl ZipPlugin {
    /// Create the plugin
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn read_entries(source: &mut dyn ReadSeek, report: &mut ReadReport) -> PluginResult<()> {
        let container_len = source.seek(SeekFrom::End(0))?;
        let tail_start = container_len.saturating_sub(MAX_TAIL);
        let tail = read_range(source, tail_start, container_len - tail_start)?;

        let end_pos = find_end_record(&tail)
            .ok_or_else(|| PluginError::malformed("no end of central directory record"))?;
        let end = EndRecord::read(&mut Cursor::new(&tail[end_pos..]))?;
        if end.disk != 0 || end.directory_disk != 0 || end.disk_entries != end.entries {
            return Err(PluginError::Unsupported("multi-disk ZIP".into()));
        }
        if end.directory_offset == u32::MAX || end.entries == u16::MAX {
            return Err(PluginError::Unsupported("ZIP64".into()));
        }

        let end_offset = tail_start + end_pos as u64;
        let directory_end = u64::from(end.directory_offset) + u64::from(end.directory_size);
        if directory_end > end_offset {
            return Err(PluginError::malformed(format!(
                "central directory ends at {directory_end}, past end record at {end_offset}"
            )));
        }

        let mut position = u64::from(end.directory_offset);
        for _ in 0..end.entries {
            source.seek(SeekFrom::Start(position))?;
            let central = CentralHeader::read(&mut &mut *source)?;
            position = source.stream_position()?;
            if position > directory_end {
                return Err(PluginError::malformed("central directory overruns its size"));
            }
            if central.is_directory() {
                continue;
            }

            let local = match Self::local_header(source, &central, end_offset) {
                Ok(local) => local,
                Err(error) => {
                    report.skip(error);
                    continue;
                }
            };
            let data_offset = u64::from(central.local_offset) + local.data_offset();

            let compression = match central.method {
                METHOD_STORED => CompressionMethod::None,
                METHOD_DEFLATE => CompressionMethod::Deflate,
                other => CompressionMethod::Unknown(other),
            };
            let resource = Resource::new(central.name(), data_offset, 0)
                .with_lengths(
                    u64::from(central.compressed_size),
                    u64::from(central.uncompressed_size),
                )
                .with_compression(compression)
                .with_property(PROP_CRC32, format!("{:08x}", central.crc32))
                .with_property(PROP_FLAGS, format!("0x{:04x}", central.flags));
            debug!(
                name = %resource.name,
                offset = resource.offset,
                method = central.method,
                "zip entry"
            );
            report.push_checked(resource, end_offset);
        }
        Ok(())
    }

    /// Local header of one entry; a bad one only loses that entry
    fn local_header(
        source: &mut dyn ReadSeek,
        central: &CentralHeader,
        end_offset: u64,
    ) -> PluginResult<LocalHeader> {
        let offset = u64::from(central.local_offset);
        if offset + LOCAL_HEADER_SIZE > end_offset {
            return Err(PluginError::OutOfBounds {
                name: central.name(),
                offset,
                length: LOCAL_HEADER_SIZE,
                container_len: end_offset,
            });
        }
        source.seek(SeekFrom::Start(offset))?;
        LocalHeader::read(&mut &mut *source).map_err(|error| {
            PluginError::malformed(format!("{}: bad local header: {error}", central.name()))
        })
    }

    fn decode(&self, resource: &Resource, stored: Vec<u8>) -> PluginResult<Vec<u8>> {
        match resource.compression {
            CompressionMethod::None => Ok(stored),
            CompressionMethod::Deflate => {
                // Never inflate past the size the directory declares
                let declared = usize::try_from(resource.decompressed_length).unwrap_or(usize::MAX);
                Ok(inflate::inflate(&stored, declared.min(self.config.output_limit()))?)
            }
            other => Err(PluginError::Unsupported(format!(
                "{}: compression {other}",
                resource.name
            ))),
        }
    }

    fn verify(resource: &Resource, data: &[u8]) -> PluginResult<()> {
        let Some(expected) = resource
            .property(PROP_CRC32)
            .and_then(|crc| u32::from_str_radix(crc, 16).ok())
        else {
            warn!(name = %resource.name, "no CRC-32 recorded, skipping check");
            return Ok(());
        };

        let mut crc = flate2::Crc::new();
        crc.update(data);
        if crc.sum() == expected {
            Ok(())
        } else {
            Err(PluginError::ChecksumMismatch {
                name: resource.name.clone(),
                expected,
                actual: crc.sum(),
            })
        }
    }

    fn flags(resource: &Resource) -> u16 {
        resource
            .property(PROP_FLAGS)
            .and_then(|f| u16::from_str_radix(f.trim_start_matches("0x"), 16).ok())
            .unwrap_or(0)
    }

    fn encode(&self, data: &[u8]) -> PluginResult<(u16, Vec<u8>)> {
        if self.config.zip.compress_on_write && !data.is_empty() {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            let deflated = encoder.finish()?;
            if deflated.len() < data.len() {
                return Ok((METHOD_DEFLATE, deflated));
            }
        }
        Ok((METHOD_STORED, data.to_vec()))
    }
}

fn too_big(what: &str) -> PluginError {
    PluginError::Unsupported(format!("{what} needs ZIP64"))
}

impl ArchivePlugin for ZipPlugin {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn rate(&self, probe: &Probe) -> Rating {
        let mut rating = Rating::NONE;
        if probe.has_extension(INFO.extensions) {
            rating += Rating::EXTENSION;
        }
        if probe.starts_with(&LOCAL_SIGNATURE) {
            rating += Rating::SIGNATURE;
        } else if probe.starts_with(&END_SIGNATURE) && probe.len == END_RECORD_SIZE {
            // Empty archive
            rating += Rating::SIGNATURE + Rating::STRUCTURE;
        }
        rating
    }

    fn read(&self, source: &mut dyn ReadSeek) -> ReadReport {
        ReadReport::collect(|report| Self::read_entries(source, report))
    }

    fn extract(&self, resource: &Resource, source: &mut dyn ReadSeek) -> PluginResult<Vec<u8>> {
        if Self::flags(resource) & FLAG_ENCRYPTED != 0 {
            return Err(PluginError::Unsupported(format!(
                "{}: encrypted ZIP entry",
                resource.name
            )));
        }
        if resource.decompressed_length > self.config.max_resource_size {
            return Err(PluginError::TooLarge {
                name: resource.name.clone(),
                size: resource.decompressed_length,
                limit: self.config.max_resource_size,
            });
        }

        let stored = read_range(source, resource.offset, resource.compressed_length)?;
        let data = self.decode(resource, stored)?;
        if data.len() as u64 != resource.decompressed_length {
            return Err(PluginError::malformed(format!(
                "{} decoded to {} bytes, directory says {}",
                resource.name,
                data.len(),
                resource.decompressed_length
            )));
        }
        if self.config.verify_checksums {
            Self::verify(resource, &data)?;
        }
        Ok(data)
    }

    fn write(&self, resources: &mut [Resource], out: &mut dyn Write) -> PluginResult<()> {
        let entries = u16::try_from(resources.len()).map_err(|_| too_big("entry count"))?;
        let mut body = Cursor::new(Vec::new());
        let mut directory = Cursor::new(Vec::new());

        for resource in resources.iter_mut() {
            let data = loaded_data(resource)?;
            let mut crc = flate2::Crc::new();
            crc.update(data);
            let (method, stored) = self.encode(data)?;

            let name = resource.name.replace('\\', "/");
            let flags = if name.is_ascii() { 0 } else { FLAG_UTF8 };
            let local_offset = u32::try_from(body.position()).map_err(|_| too_big("offset"))?;
            let compressed_size = u32::try_from(stored.len()).map_err(|_| too_big("entry"))?;
            let uncompressed_size = u32::try_from(data.len()).map_err(|_| too_big("entry"))?;
            let name_len = u16::try_from(name.len())
                .map_err(|_| PluginError::Unsupported(format!("name too long: {}", resource.name)))?;

            let local = LocalHeader {
                version: VERSION,
                flags,
                method,
                time: 0,
                date: DOS_DATE,
                crc32: crc.sum(),
                compressed_size,
                uncompressed_size,
                name_len,
                extra_len: 0,
            };
            local.write(&mut body)?;
            body.write_all(name.as_bytes())?;
            let data_offset = body.position();
            body.write_all(&stored)?;

            CentralHeader {
                version_made_by: VERSION,
                version: VERSION,
                flags,
                method,
                time: 0,
                date: DOS_DATE,
                crc32: crc.sum(),
                compressed_size,
                uncompressed_size,
                name_len,
                extra_len: 0,
                comment_len: 0,
                disk_start: 0,
                internal_attributes: 0,
                external_attributes: 0,
                local_offset,
                name: name.as_bytes().to_vec(),
                extra: Vec::new(),
                comment: Vec::new(),
            }
            .write(&mut directory)?;

            resource.name = name;
            resource.offset = data_offset;
            resource.compressed_length = u64::from(compressed_size);
            resource.decompressed_length = u64::from(uncompressed_size);
            resource.compression = if method == METHOD_DEFLATE {
                CompressionMethod::Deflate
            } else {
                CompressionMethod::None
            };
            resource.set_property(PROP_CRC32, format!("{:08x}", crc.sum()));
            resource.set_property(PROP_FLAGS, format!("0x{flags:04x}"));
        }

        let end = EndRecord {
            disk: 0,
            directory_disk: 0,
            disk_entries: entries,
            entries,
            directory_size: u32::try_from(directory.get_ref().len())
                .map_err(|_| too_big("directory"))?,
            directory_offset: u32::try_from(body.position()).map_err(|_| too_big("offset"))?,
            comment_len: 0,
        };
        let mut trailer = Cursor::new(Vec::new());
        end.write(&mut trailer)?;

        out.write_all(body.get_ref())?;
        out.write_all(directory.get_ref())?;
        out.write_all(trailer.get_ref())?;
        Ok(())
    }

    fn columns(&self) -> Vec<Column> {
        let mut columns = generic_columns();
        columns.extend([CRC_COLUMN, FLAGS_COLUMN]);
        columns
    }

    fn column_value(&self, resource: &Resource, column: char) -> Option<String> {
        match column {
            'K' => resource.property(PROP_CRC32).map(str::to_string),
            'F' => {
                let flags = Self::flags(resource);
                let mut parts = Vec::new();
                if flags & FLAG_ENCRYPTED != 0 {
                    parts.push("encrypted");
                }
                if flags & FLAG_DATA_DESCRIPTOR != 0 {
                    parts.push("descriptor");
                }
                if flags & FLAG_UTF8 != 0 {
                    parts.push("utf8");
                }
                Some(parts.join(","))
            }
            other => generic_value(resource, other),
        }
    }
}
