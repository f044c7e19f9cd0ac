#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! End-to-end test of a third-party plugin built on the public contract
//!
//! The container is a minimal format whose entries are all encrypted with
//! one MPQ-cipher key: magic "KEYD", a little-endian entry count, then per
//! entry a name length byte, the name, a little-endian size and the data.

use pakrat_crypto::mpq::{Direction, MpqCipher};
use pakrat_formats::archive::Session;
use pakrat_formats::config::ExtractorConfig;
use pakrat_formats::plugin::{
    ArchivePlugin, PluginError, PluginInfo, PluginRegistry, PluginResult, Probe, Rating,
    ReadReport, ReadSeek, check_bounds, read_range,
};
use pakrat_formats::resource::Resource;
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;

const MAGIC: &[u8; 4] = b"KEYD";
const KEY: u32 = 0x1234_5678;

const INFO: PluginInfo = PluginInfo {
    code: "keyd",
    name: "Keyed test container",
    extensions: &["keyd"],
    can_write: false,
};

struct KeyedPlugin;

fn read_u32(source: &mut dyn ReadSeek) -> PluginResult<u32> {
    let mut word = [0u8; 4];
    source.read_exact(&mut word)?;
    Ok(u32::from_le_bytes(word))
}

impl ArchivePlugin for KeyedPlugin {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn rate(&self, probe: &Probe) -> Rating {
        if probe.starts_with(MAGIC) {
            Rating::SIGNATURE
        } else {
            Rating::NONE
        }
    }

    fn read(&self, source: &mut dyn ReadSeek) -> ReadReport {
        ReadReport::collect(|report| {
            let len = source.seek(SeekFrom::End(0))?;
            source.seek(SeekFrom::Start(4))?;
            let count = read_u32(source)?;
            for _ in 0..count {
                let mut name_len = [0u8; 1];
                source.read_exact(&mut name_len)?;
                let mut name = vec![0u8; usize::from(name_len[0])];
                source.read_exact(&mut name)?;
                let size = read_u32(source)?;
                let offset = source.stream_position()?;

                let resource = Resource::new(String::from_utf8_lossy(&name), offset, u64::from(size));
                check_bounds(&resource, len)?;
                source.seek(SeekFrom::Start(resource.end_offset()))?;
                report.push(resource);
            }
            Ok(())
        })
    }

    fn extract(&self, resource: &Resource, source: &mut dyn ReadSeek) -> PluginResult<Vec<u8>> {
        let mut data = read_range(source, resource.offset, resource.compressed_length)?;
        MpqCipher::new(KEY, Direction::Decrypt).apply(&mut data);
        Ok(data)
    }
}

fn plaintexts() -> [(&'static str, &'static [u8]); 3] {
    [
        ("scripts/intro.lua", b"print('intro') -- 20b"),
        ("textures/stone.dds", b"DDS |\x00\x00\x00 texture payload"),
        ("readme", b"abc"),
    ]
}

fn container() -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&3u32.to_le_bytes());
    for (name, data) in plaintexts() {
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        let mut encrypted = data.to_vec();
        MpqCipher::new(KEY, Direction::Encrypt).apply(&mut encrypted);
        out.extend_from_slice(&encrypted);
    }
    out
}

fn session() -> Session {
    let config = ExtractorConfig::default();
    let mut registry = PluginRegistry::with_defaults(&config);
    registry.register(Arc::new(KeyedPlugin));
    Session::with_registry(registry, config)
}

#[test]
fn keyed_container_decrypts_every_entry_in_order() {
    let mut session = session();
    let archive = session.open_reader(None, Cursor::new(container()), None).unwrap();
    assert_eq!(archive.read_plugin().info().code, "keyd");
    assert_eq!(archive.len(), 3);
    assert!(archive.is_complete());

    let names: Vec<_> = archive.resources().iter().map(|r| r.name.clone()).collect();
    let expected: Vec<_> = plaintexts().iter().map(|(n, _)| (*n).to_string()).collect();
    assert_eq!(names, expected);

    for (index, (_, plaintext)) in plaintexts().iter().enumerate() {
        assert_eq!(session.extract(index).unwrap(), plaintext.to_vec());
    }
}

#[test]
fn keyed_container_encrypted_bytes_differ_from_plaintext() {
    let data = container();
    let (name, plaintext) = plaintexts()[1];
    let start = 8 + 1 + plaintexts()[0].0.len() + 4 + plaintexts()[0].1.len() + 1 + name.len() + 4;
    assert_ne!(&data[start..start + plaintext.len()], plaintext);
    // The trailing bytes past the last whole word pass through
    let tail = plaintext.len() - plaintext.len() % 4;
    assert_eq!(&data[start + tail..start + plaintext.len()], &plaintext[tail..]);
}

#[test]
fn rename_changes_only_the_name() {
    let mut session = session();
    session.open_reader(None, Cursor::new(container()), None).unwrap();
    let archive = session.current_mut().unwrap();

    let before: Vec<Resource> = archive.resources().to_vec();
    archive.resources_mut()[1].rename("textures/granite.dds");

    let after = archive.resources();
    assert_eq!(after.len(), 3);
    assert_eq!(after[1].name, "textures/granite.dds");
    assert_eq!(after[1].offset, before[1].offset);
    assert_eq!(after[1].compressed_length, before[1].compressed_length);
    assert_eq!(after[1].decompressed_length, before[1].decompressed_length);
    assert_eq!(after[1].properties, before[1].properties);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);

    assert_eq!(session.extract(1).unwrap(), plaintexts()[1].1.to_vec());
}

#[test]
fn truncated_container_reports_partial_read() {
    let mut data = container();
    data.truncate(data.len() - 2);

    let report = KeyedPlugin.read(&mut Cursor::new(data.clone()));
    assert_eq!(report.resources.len(), 2);
    assert!(matches!(report.failure, Some(PluginError::OutOfBounds { .. })));

    // The session keeps what was read and records the failure
    let mut session = session();
    let archive = session.open_reader(None, Cursor::new(data), None).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(!archive.is_complete());
    assert!(archive.read_failure().unwrap().is_malformed());
}

#[test]
fn container_cut_inside_a_header_is_an_io_failure() {
    let data = container();
    let report = KeyedPlugin.read(&mut Cursor::new(data[..10].to_vec()));
    assert!(report.resources.is_empty());
    assert!(report.failure.unwrap().is_io());
}
