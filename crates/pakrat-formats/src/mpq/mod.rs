//! Blizzard MPQ archives (format versions 0 and 1)
//!
//! Entries are found through two encrypted tables. The hash table maps
//! hashed names to block indices; the block table holds offsets, sizes and
//! flags. Names themselves are not stored, so they come from the archive's
//! `(listfile)` and from [`MpqConfig::extra_names`](crate::config::MpqConfig).
//! Blocks no name resolves to are reported as `File00000012.xxx`.
//!
//! Encrypted entries are keyed by their original name. The key is recorded
//! on the [`Resource`] when the archive is read, so renaming a resource
//! does not stop it from being extracted.

mod header;
mod sectors;
mod tables;

pub use header::{
    BlockEntry, HEADER_SIZE, HashEntry, MASK_ZLIB, MPQ_MAGIC, MpqHeader, UserDataHeader,
    describe_flags, flags,
};
pub use tables::HashTable;

use crate::config::ExtractorConfig;
use crate::plugin::column::Column;
use crate::plugin::{
    ArchivePlugin, PluginError, PluginInfo, PluginResult, Probe, Rating, ReadReport, ReadSeek,
    generic_columns, generic_value, loaded_data, read_range,
};
use crate::resource::{CompressionMethod, Resource};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use header::{HEADER_ALIGNMENT, MAP_PREAMBLE_MAGIC, TABLE_ENTRY_SIZE, USER_DATA_MAGIC};
use pakrat_crypto::lut::CryptoLut;
use sectors::StoredLayout;
use std::collections::HashMap;
use std::io::{SeekFrom, Write};
use tables::{block_table_bytes, parse_block_table};
use tracing::{debug, warn};

const INFO: PluginInfo = PluginInfo {
    code: "mpq",
    name: "Blizzard MPQ",
    extensions: &["mpq", "w3m", "w3x", "scm", "scx"],
    can_write: true,
};

/// Name list stored inside the archive
pub const LISTFILE: &str = "(listfile)";
/// Internal files looked up even without a listfile
const INTERNAL_NAMES: [&str; 3] = [LISTFILE, "(attributes)", "(signature)"];

/// Property holding the block flags as hex
pub const PROP_FLAGS: &str = "Flags";
/// Property holding the entry key as hex
pub const PROP_KEY: &str = "Key";
/// Property holding the block table index
pub const PROP_BLOCK: &str = "Block Index";
/// Property holding the archive sector size
pub const PROP_SECTOR_SIZE: &str = "Sector Size";

/// Block flags column
pub const FLAGS_COLUMN: Column = Column::new('F', "Flags");
/// Entry key column
pub const KEY_COLUMN: Column = Column::new('K', "Key");
/// Block index column
pub const BLOCK_COLUMN: Column = Column::new('B', "Block");

/// Headers further in than this are not searched for
const HEADER_SEARCH_LIMIT: u64 = 0x10_0000;

/// Plugin for MPQ archives
#[derive(Debug, Clone, Default)]
pub struct MpqPlugin {
    config: ExtractorConfig,
}

/// Header plus where it was found
struct Located {
    base: u64,
    header: MpqHeader,
}

fn hex_property(resource: &Resource, key: &str) -> Option<u32> {
    let value = resource.property(key)?;
    u32::from_str_radix(value.trim_start_matches("0x"), 16).ok()
}

fn table_range(
    what: &str,
    base: u64,
    offset: u32,
    entries: u32,
    container_len: u64,
) -> PluginResult<(u64, u64)> {
    let start = base + u64::from(offset);
    let length = u64::from(entries) * TABLE_ENTRY_SIZE;
    if start + length > container_len {
        return Err(PluginError::malformed(format!(
            "{what} at {start} ({length} bytes) outside {container_len}-byte container"
        )));
    }
    Ok((start, length))
}

fn u32_field(value: u64, what: &str) -> PluginResult<u32> {
    u32::try_from(value).map_err(|_| PluginError::Unsupported(format!("{what} over 4 GiB")))
}

/// Names listed in a `(listfile)`
pub fn parse_listfile(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .split(['\r', '\n', ';'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl MpqPlugin {
    /// Create the plugin
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn locate(source: &mut dyn ReadSeek, container_len: u64) -> PluginResult<Located> {
        let mut offset = 0u64;
        while offset + u64::from(HEADER_SIZE) <= container_len && offset <= HEADER_SEARCH_LIMIT {
            let magic = read_range(source, offset, 4)?;
            if magic == MPQ_MAGIC {
                source.seek(SeekFrom::Start(offset))?;
                let header = MpqHeader::read(&mut &mut *source)?;
                return Ok(Located {
                    base: offset,
                    header,
                });
            }
            if magic == USER_DATA_MAGIC {
                source.seek(SeekFrom::Start(offset))?;
                let user = UserDataHeader::read(&mut &mut *source)?;
                if user.header_offset == 0 {
                    return Err(PluginError::malformed("user data header points at itself"));
                }
                offset += u64::from(user.header_offset);
                continue;
            }
            offset += HEADER_ALIGNMENT;
        }
        Err(PluginError::malformed("no MPQ header found"))
    }

    /// Resource for a block; `name` is `None` when no listed name hashes to it
    fn describe(name: Option<String>, index: usize, block: &BlockEntry, located: &Located) -> Resource {
        let compression = if block.has(flags::IMPLODE) {
            CompressionMethod::Unknown(0x0100)
        } else if block.has(flags::COMPRESS) {
            CompressionMethod::Multi(0)
        } else {
            CompressionMethod::None
        };

        let known = name.is_some();
        let name = name.unwrap_or_else(|| format!("File{index:08}.xxx"));
        let mut resource = Resource::new(name, located.base + u64::from(block.file_pos), 0)
            .with_lengths(
                u64::from(block.compressed_size),
                u64::from(block.file_size),
            )
            .with_compression(compression)
            .with_property(PROP_FLAGS, format!("0x{:08x}", block.flags))
            .with_property(PROP_BLOCK, index.to_string())
            .with_property(PROP_SECTOR_SIZE, located.header.sector_size().to_string());

        if block.has(flags::ENCRYPTED) && known {
            let key = CryptoLut::shared().file_key(
                &resource.name,
                block.file_pos,
                block.file_size,
                block.has(flags::FIX_KEY),
            );
            resource.set_property(PROP_KEY, format!("0x{key:08x}"));
        }
        resource
    }

    fn resolve_names(
        &self,
        hash_table: &HashTable,
        blocks: &[BlockEntry],
        located: &Located,
        source: &mut dyn ReadSeek,
    ) -> HashMap<usize, String> {
        let mut names = HashMap::new();
        let add = |names: &mut HashMap<usize, String>, name: &str| {
            for index in hash_table.find(name) {
                let index = index as usize;
                if index < blocks.len() {
                    names.entry(index).or_insert_with(|| name.to_string());
                }
            }
        };

        for name in INTERNAL_NAMES {
            add(&mut names, name);
        }
        for name in &self.config.mpq.extra_names {
            add(&mut names, name);
        }

        let listfile = hash_table
            .find(LISTFILE)
            .into_iter()
            .map(|index| index as usize)
            .find(|&index| index < blocks.len());
        if let Some(index) = listfile {
            let resource = Self::describe(Some(LISTFILE.to_string()), index, &blocks[index], located);
            match self.extract(&resource, source) {
                Ok(data) => {
                    let listed = parse_listfile(&data);
                    debug!(names = listed.len(), "read (listfile)");
                    for name in &listed {
                        add(&mut names, name);
                    }
                }
                Err(error) => warn!(%error, "could not read (listfile), entries stay unnamed"),
            }
        }
        names
    }

    fn read_entries(&self, source: &mut dyn ReadSeek, report: &mut ReadReport) -> PluginResult<()> {
        let container_len = source.seek(SeekFrom::End(0))?;
        let located = Self::locate(source, container_len)?;
        let header = located.header;
        if !header.is_plausible() {
            if header.format_version > 1 {
                return Err(PluginError::Unsupported(format!(
                    "MPQ format version {}",
                    header.format_version
                )));
            }
            return Err(PluginError::malformed("implausible MPQ header"));
        }

        let (start, length) = table_range(
            "hash table",
            located.base,
            header.hash_table_offset,
            header.hash_table_entries,
            container_len,
        )?;
        let hash_table = HashTable::parse(read_range(source, start, length)?)?;

        let (start, length) = table_range(
            "block table",
            located.base,
            header.block_table_offset,
            header.block_table_entries,
            container_len,
        )?;
        let blocks = parse_block_table(read_range(source, start, length)?)?;
        debug!(
            base = located.base,
            hash_slots = hash_table.len(),
            blocks = blocks.len(),
            "mpq tables"
        );

        let mut names = self.resolve_names(&hash_table, &blocks, &located, source);
        for (index, block) in blocks.iter().enumerate() {
            if !block.has(flags::EXISTS) {
                continue;
            }
            let resource = Self::describe(names.remove(&index), index, block, &located);
            debug!(name = %resource.name, flags = %describe_flags(block.flags), "mpq entry");
            report.push_checked(resource, container_len);
        }
        Ok(())
    }

    fn write_archive(&self, resources: &mut [Resource], out: &mut dyn Write) -> PluginResult<()> {
        let mpq = &self.config.mpq;
        let sector_size = u64::from(mpq.sector_size());
        let lut = CryptoLut::shared();

        let listed: Vec<&str> = resources
            .iter()
            .map(|r| r.name.as_str())
            .filter(|name| !name.eq_ignore_ascii_case(LISTFILE))
            .collect();
        let mut listfile = Vec::new();
        for name in &listed {
            listfile.extend_from_slice(name.as_bytes());
            listfile.extend_from_slice(b"\r\n");
        }
        let has_listfile = listed.len() < resources.len();

        let mut body = Vec::new();
        let mut blocks = Vec::with_capacity(resources.len() + 1);
        let mut hash_table = HashTable::for_files(resources.len() + usize::from(!has_listfile));

        let mut store = |name: &str, data: &[u8], body: &mut Vec<u8>| -> PluginResult<(BlockEntry, Option<u32>)> {
            let file_pos = u32_field(u64::from(HEADER_SIZE) + body.len() as u64, "archive")?;
            let file_size = u32_field(data.len() as u64, "entry")?;
            let key = mpq
                .encrypt_on_write
                .then(|| lut.file_key(name, file_pos, file_size, false));

            let (stored, block_flags) = sectors::encode(data, sector_size, mpq.compress_on_write, key)?;
            body.extend_from_slice(&stored);
            let block = BlockEntry {
                file_pos,
                compressed_size: u32_field(stored.len() as u64, "entry")?,
                file_size,
                flags: flags::EXISTS | block_flags,
            };
            hash_table.insert(name, blocks.len() as u32)?;
            blocks.push(block);
            Ok((block, key))
        };

        for (index, resource) in resources.iter_mut().enumerate() {
            let (block, key) = if resource.name.eq_ignore_ascii_case(LISTFILE) {
                store(&resource.name, &listfile, &mut body)?
            } else {
                store(&resource.name, loaded_data(resource)?, &mut body)?
            };

            resource.offset = u64::from(block.file_pos);
            resource.compressed_length = u64::from(block.compressed_size);
            resource.decompressed_length = u64::from(block.file_size);
            resource.compression = if block.has(flags::COMPRESS) {
                CompressionMethod::Multi(0)
            } else {
                CompressionMethod::None
            };
            resource.set_property(PROP_FLAGS, format!("0x{:08x}", block.flags));
            resource.set_property(PROP_BLOCK, index.to_string());
            resource.set_property(PROP_SECTOR_SIZE, sector_size.to_string());
            match key {
                Some(key) => resource.set_property(PROP_KEY, format!("0x{key:08x}")),
                None => {
                    resource.properties.remove(PROP_KEY);
                }
            }
        }
        if !has_listfile {
            store(LISTFILE, &listfile, &mut body)?;
        }

        let hash_bytes = hash_table.to_bytes()?;
        let block_bytes = block_table_bytes(&blocks)?;
        let hash_table_offset = u32_field(u64::from(HEADER_SIZE) + body.len() as u64, "archive")?;
        let block_table_offset = u32_field(
            u64::from(hash_table_offset) + hash_bytes.len() as u64,
            "archive",
        )?;
        let header = MpqHeader {
            header_size: HEADER_SIZE,
            archive_size: u32_field(
                u64::from(block_table_offset) + block_bytes.len() as u64,
                "archive",
            )?,
            format_version: 0,
            sector_size_shift: mpq.sector_size_shift.min(15),
            hash_table_offset,
            block_table_offset,
            hash_table_entries: hash_table.len() as u32,
            block_table_entries: blocks.len() as u32,
        };

        let mut head = Cursor::new(Vec::new());
        header.write(&mut head)?;
        out.write_all(head.get_ref())?;
        out.write_all(&body)?;
        out.write_all(&hash_bytes)?;
        out.write_all(&block_bytes)?;
        Ok(())
    }
}

impl ArchivePlugin for MpqPlugin {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn rate(&self, probe: &Probe) -> Rating {
        let mut rating = Rating::NONE;
        if probe.has_extension(INFO.extensions) {
            rating += Rating::EXTENSION;
        }
        if probe.starts_with(&MPQ_MAGIC) {
            rating += Rating::SIGNATURE;
            let header = MpqHeader::read(&mut Cursor::new(&probe.head)).ok();
            let fits = header.is_some_and(|h| {
                h.is_plausible()
                    && u64::from(h.hash_table_offset)
                        + u64::from(h.hash_table_entries) * TABLE_ENTRY_SIZE
                        <= probe.len
                    && u64::from(h.block_table_offset)
                        + u64::from(h.block_table_entries) * TABLE_ENTRY_SIZE
                        <= probe.len
            });
            if fits {
                rating += Rating::STRUCTURE;
            }
        } else if probe.starts_with(&USER_DATA_MAGIC) || probe.starts_with(&MAP_PREAMBLE_MAGIC) {
            rating += Rating::SIGNATURE;
        }
        rating
    }

    fn read(&self, source: &mut dyn ReadSeek) -> ReadReport {
        ReadReport::collect(|report| self.read_entries(source, report))
    }

    fn extract(&self, resource: &Resource, source: &mut dyn ReadSeek) -> PluginResult<Vec<u8>> {
        if resource.decompressed_length > self.config.max_resource_size {
            return Err(PluginError::TooLarge {
                name: resource.name.clone(),
                size: resource.decompressed_length,
                limit: self.config.max_resource_size,
            });
        }
        let block_flags = hex_property(resource, PROP_FLAGS)
            .ok_or_else(|| PluginError::malformed(format!("{} has no block flags", resource.name)))?;
        let sector_size = resource
            .property(PROP_SECTOR_SIZE)
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&s| s >= 512)
            .ok_or_else(|| PluginError::malformed(format!("{} has no sector size", resource.name)))?;

        let stored = read_range(source, resource.offset, resource.compressed_length)?;
        sectors::decode(
            &stored,
            &StoredLayout {
                sector_size,
                flags: block_flags,
                key: hex_property(resource, PROP_KEY),
                file_size: resource.decompressed_length,
            },
        )
    }

    fn write(&self, resources: &mut [Resource], out: &mut dyn Write) -> PluginResult<()> {
        self.write_archive(resources, out)
    }

    fn columns(&self) -> Vec<Column> {
        let mut columns = generic_columns();
        columns.extend([FLAGS_COLUMN, KEY_COLUMN, BLOCK_COLUMN]);
        columns
    }

    fn column_value(&self, resource: &Resource, column: char) -> Option<String> {
        match column {
            'F' => hex_property(resource, PROP_FLAGS).map(describe_flags),
            'K' => Some(resource.property(PROP_KEY).unwrap_or_default().to_string()),
            'B' => resource.property(PROP_BLOCK).map(str::to_string),
            other => generic_value(resource, other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::MpqConfig;
    use pretty_assertions::assert_eq;

    fn files() -> Vec<Resource> {
        vec![
            Resource::from_data("war3map.j", b"function main takes nothing returns nothing\n".repeat(200)),
            Resource::from_data("Units\\Human\\Footman.mdx", (0..=255u8).cycle().take(9000).collect()),
            Resource::from_data("war3map.w3e", Vec::new()),
        ]
    }

    fn build(plugin: &MpqPlugin, resources: &mut [Resource]) -> Vec<u8> {
        let mut out = Vec::new();
        plugin.write(resources, &mut out).unwrap();
        out
    }

    fn encrypting() -> MpqPlugin {
        MpqPlugin::new(ExtractorConfig::default().with_mpq(MpqConfig::default().with_encryption(true)))
    }

    #[test]
    fn test_round_trip() {
        let plugin = MpqPlugin::default();
        let mut cursor = Cursor::new(build(&plugin, &mut files()));

        let report = plugin.read(&mut cursor);
        assert!(report.is_complete());
        let names: Vec<_> = report.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["war3map.j", "Units\\Human\\Footman.mdx", "war3map.w3e", LISTFILE]
        );

        for (resource, original) in report.resources.iter().zip(files()) {
            let data = plugin.extract(resource, &mut cursor).unwrap();
            assert_eq!(data, original.data.unwrap());
        }
        assert_eq!(report.resources[0].compression, CompressionMethod::Multi(0));
        assert!(report.resources[0].compressed_length < report.resources[0].decompressed_length);
    }

    #[test]
    fn test_listfile_contents() {
        let plugin = MpqPlugin::default();
        let mut cursor = Cursor::new(build(&plugin, &mut files()));
        let resources = plugin.read(&mut cursor).into_result().unwrap();

        let listfile = plugin.extract(&resources[3], &mut cursor).unwrap();
        assert_eq!(
            parse_listfile(&listfile),
            vec!["war3map.j", "Units\\Human\\Footman.mdx", "war3map.w3e"]
        );
    }

    #[test]
    fn test_encrypted_round_trip() {
        let plugin = encrypting();
        let mut cursor = Cursor::new(build(&plugin, &mut files()));
        let resources = plugin.read(&mut cursor).into_result().unwrap();

        let script = &resources[0];
        assert_eq!(script.property(PROP_FLAGS).map(|f| f.len()), Some(10));
        let key = hex_property(script, PROP_KEY).unwrap();
        assert_eq!(
            key,
            CryptoLut::shared().file_key("war3map.j", HEADER_SIZE, script.decompressed_length as u32, false)
        );
        assert_eq!(
            plugin.extract(script, &mut cursor).unwrap(),
            files()[0].data.clone().unwrap()
        );
    }

    #[test]
    fn test_renamed_encrypted_entry_still_extracts() {
        let plugin = encrypting();
        let mut cursor = Cursor::new(build(&plugin, &mut files()));
        let mut resources = plugin.read(&mut cursor).into_result().unwrap();

        resources[1].rename("Units\\Orc\\Grunt.mdx");
        let data = plugin.extract(&resources[1], &mut cursor).unwrap();
        assert_eq!(data, files()[1].data.clone().unwrap());
    }

    #[test]
    fn test_write_updates_resources() {
        let plugin = encrypting();
        let mut resources = files();
        let archive = build(&plugin, &mut resources);

        assert_eq!(resources[0].offset, u64::from(HEADER_SIZE));
        assert_eq!(resources[1].offset, resources[0].end_offset());
        assert_eq!(resources[2].compressed_length, 0);
        assert!(resources[0].property(PROP_KEY).is_some());

        let reread = plugin.read(&mut Cursor::new(archive)).into_result().unwrap();
        for (written, read) in resources.iter().zip(&reread) {
            assert_eq!(written.offset, read.offset);
            assert_eq!(written.properties, read.properties);
        }
    }

    #[test]
    fn test_unreadable_listfile_leaves_entries_unnamed() {
        let plugin = MpqPlugin::default();
        let mut archive = build(&plugin, &mut files());

        // Mark the listfile block as imploded so it cannot be decoded
        let header = MpqHeader::read(&mut Cursor::new(&archive)).unwrap();
        let start = header.block_table_offset as usize;
        let end = start + header.block_table_entries as usize * 16;
        let mut blocks = parse_block_table(archive[start..end].to_vec()).unwrap();
        blocks[3].flags |= flags::IMPLODE;
        archive[start..end].copy_from_slice(&block_table_bytes(&blocks).unwrap());

        let resources = plugin.read(&mut Cursor::new(archive)).into_result().unwrap();
        let names: Vec<_> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["File00000000.xxx", "File00000001.xxx", "File00000002.xxx", LISTFILE]
        );
        assert_eq!(resources[3].compression, CompressionMethod::Unknown(0x0100));
    }

    #[test]
    fn test_extra_names() {
        let mut archive = build(&MpqPlugin::default(), &mut files());
        let header = MpqHeader::read(&mut Cursor::new(&archive)).unwrap();
        let start = header.block_table_offset as usize;
        let end = start + header.block_table_entries as usize * 16;
        let mut blocks = parse_block_table(archive[start..end].to_vec()).unwrap();
        blocks[3].flags |= flags::IMPLODE;
        archive[start..end].copy_from_slice(&block_table_bytes(&blocks).unwrap());

        let plugin = MpqPlugin::new(
            ExtractorConfig::default().with_mpq(MpqConfig::default().with_extra_name("WAR3MAP.J")),
        );
        let resources = plugin.read(&mut Cursor::new(archive)).into_result().unwrap();
        assert_eq!(resources[0].name, "WAR3MAP.J");
        assert_eq!(resources[1].name, "File00000001.xxx");
    }

    #[test]
    fn test_map_preamble() {
        let mut data = b"HM3W".to_vec();
        data.resize(512, 0);
        data.extend(build(&MpqPlugin::default(), &mut files()));

        let plugin = MpqPlugin::default();
        assert_eq!(
            plugin.rate(&Probe::from_bytes(&data, Some("w3x"))),
            Rating::SIGNATURE + Rating::EXTENSION
        );

        let mut cursor = Cursor::new(data);
        let resources = plugin.read(&mut cursor).into_result().unwrap();
        assert_eq!(resources[0].offset, 512 + u64::from(HEADER_SIZE));
        assert_eq!(
            plugin.extract(&resources[0], &mut cursor).unwrap(),
            files()[0].data.clone().unwrap()
        );
    }

    #[test]
    fn test_user_data_header() {
        let mut data = Vec::new();
        UserDataHeader {
            user_data_size: 0x100,
            header_offset: 0x400,
            user_data_header_size: 16,
        }
        .write(&mut Cursor::new(&mut data))
        .unwrap();
        data.resize(0x400, 0);
        data.extend(build(&MpqPlugin::default(), &mut files()));

        let resources = MpqPlugin::default()
            .read(&mut Cursor::new(data))
            .into_result()
            .unwrap();
        assert_eq!(resources.len(), 4);
        assert_eq!(resources[0].offset, 0x400 + u64::from(HEADER_SIZE));
    }

    #[test]
    fn test_bad_block_does_not_hide_the_rest() {
        let mut archive = build(&MpqPlugin::default(), &mut files());
        let header = MpqHeader::read(&mut Cursor::new(&archive)).unwrap();
        let start = header.block_table_offset as usize;
        let end = start + header.block_table_entries as usize * 16;
        let mut blocks = parse_block_table(archive[start..end].to_vec()).unwrap();
        blocks[0].compressed_size = 0x7FFF_0000;
        archive[start..end].copy_from_slice(&block_table_bytes(&blocks).unwrap());

        let plugin = MpqPlugin::default();
        let mut cursor = Cursor::new(archive);
        let report = plugin.read(&mut cursor);
        let names: Vec<_> = report.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Units\\Human\\Footman.mdx", "war3map.w3e", LISTFILE]
        );
        assert_eq!(report.skipped, 1);
        assert!(matches!(report.failure, Some(PluginError::OutOfBounds { .. })));
        assert_eq!(
            plugin.extract(&report.resources[0], &mut cursor).unwrap(),
            files()[1].data.clone().unwrap()
        );
    }

    #[test]
    fn test_truncated_archive() {
        let mut archive = build(&MpqPlugin::default(), &mut files());
        archive.truncate(archive.len() - 20);
        let report = MpqPlugin::default().read(&mut Cursor::new(archive));
        assert!(report.resources.is_empty());
        assert!(report.failure.unwrap().is_malformed());
    }

    #[test]
    fn test_not_an_archive() {
        let report = MpqPlugin::default().read(&mut Cursor::new(vec![0u8; 2048]));
        assert!(report.failure.unwrap().is_malformed());
    }

    #[test]
    fn test_rate() {
        let plugin = MpqPlugin::default();
        let archive = build(&plugin, &mut files());
        assert_eq!(plugin.rate(&Probe::from_bytes(&archive, Some("mpq"))), Rating(100));
        assert_eq!(plugin.rate(&Probe::from_bytes(&archive, None)), Rating(75));
        assert_eq!(plugin.rate(&Probe::from_bytes(b"PACK", Some("pak"))), Rating::NONE);
    }

    #[test]
    fn test_columns() {
        let plugin = encrypting();
        let mut cursor = Cursor::new(build(&plugin, &mut files()));
        let resources = plugin.read(&mut cursor).into_result().unwrap();

        assert!(plugin.columns().contains(&FLAGS_COLUMN));
        assert_eq!(
            plugin.column_value(&resources[0], 'F').as_deref(),
            Some("exists,compressed,encrypted")
        );
        assert_eq!(plugin.column_value(&resources[2], 'F').as_deref(), Some("exists,encrypted"));
        assert_eq!(plugin.column_value(&resources[1], 'B').as_deref(), Some("1"));
        assert_eq!(plugin.column_value(&resources[0], 'P').as_deref(), Some("war3map.j"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut resources = vec![
            Resource::from_data("a.txt", b"1".to_vec()),
            Resource::from_data("A.TXT", b"2".to_vec()),
        ];
        let err = MpqPlugin::default().write(&mut resources, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, PluginError::Unsupported(_)));
    }
}
