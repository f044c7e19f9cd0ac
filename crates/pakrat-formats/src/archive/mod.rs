//! An opened container and the session that holds it
//!
//! [`Archive`] is plain owned data: the resources a plugin enumerated, the
//! plugin that reads them, and optionally a different plugin to write them
//! back with. Byte access always goes through the read plugin and a source
//! supplied by the caller; [`Session`] pairs an archive with its open source.

mod session;

pub use session::Session;

use crate::plugin::{ArchivePlugin, Column, PluginError, PluginResult, ReadSeek};
use crate::resource::{Resource, name_hash};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resources of one container plus the plugins that handle it
pub struct Archive {
    base_path: Option<PathBuf>,
    read_plugin: Arc<dyn ArchivePlugin>,
    write_plugin: Option<Arc<dyn ArchivePlugin>>,
    resources: Vec<Resource>,
    container_len: u64,
    read_failure: Option<PluginError>,
}

impl Archive {
    /// Archive over enumerated resources
    pub fn new(read_plugin: Arc<dyn ArchivePlugin>, resources: Vec<Resource>, container_len: u64) -> Self {
        Self {
            base_path: None,
            read_plugin,
            write_plugin: None,
            resources,
            container_len,
            read_failure: None,
        }
    }

    /// Record where the container came from
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Record why enumeration stopped early
    #[must_use]
    pub fn with_read_failure(mut self, failure: Option<PluginError>) -> Self {
        self.read_failure = failure;
        self
    }

    /// Path of the container, if it was opened from a file
    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    /// Plugin that enumerated the container
    pub fn read_plugin(&self) -> &Arc<dyn ArchivePlugin> {
        &self.read_plugin
    }

    /// Plugin used by [`Archive::write_to`]; the read plugin unless replaced
    pub fn write_plugin(&self) -> &Arc<dyn ArchivePlugin> {
        self.write_plugin.as_ref().unwrap_or(&self.read_plugin)
    }

    /// Write with a different plugin, or `None` to use the read plugin
    pub fn set_write_plugin(&mut self, plugin: Option<Arc<dyn ArchivePlugin>>) {
        self.write_plugin = plugin;
    }

    /// Container size in bytes
    pub fn container_len(&self) -> u64 {
        self.container_len
    }

    /// Why enumeration stopped early, if it did
    pub fn read_failure(&self) -> Option<&PluginError> {
        self.read_failure.as_ref()
    }

    /// Whether every entry was enumerated
    pub fn is_complete(&self) -> bool {
        self.read_failure.is_none()
    }

    /// Resources in container order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// The live resource collection
    pub fn resources_mut(&mut self) -> &mut Vec<Resource> {
        &mut self.resources
    }

    /// Resource at `index`
    pub fn resource(&self, index: usize) -> Option<&Resource> {
        self.resources.get(index)
    }

    fn checked(&self, index: usize) -> PluginResult<&Resource> {
        self.resources.get(index).ok_or(PluginError::NoSuchResource {
            index,
            len: self.resources.len(),
        })
    }

    /// Index of the first resource named `name`, ignoring case and separator style
    pub fn find(&self, name: &str) -> Option<usize> {
        let hash = name_hash(name);
        self.resources.iter().position(|r| r.name_hash() == hash)
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether there are no resources
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Decode one resource without caching it
    pub fn extract(&self, index: usize, source: &mut dyn ReadSeek) -> PluginResult<Vec<u8>> {
        let resource = self.checked(index)?;
        self.read_plugin.extract(resource, source)
    }

    /// Decode one resource into its cache
    pub fn load(&mut self, index: usize, source: &mut dyn ReadSeek) -> PluginResult<&[u8]> {
        let data = self.extract(index, source)?;
        let resource = &mut self.resources[index];
        Ok(resource.data.insert(data).as_slice())
    }

    /// Decode every resource that is not cached yet
    pub fn load_all(&mut self, source: &mut dyn ReadSeek) -> PluginResult<()> {
        for index in 0..self.resources.len() {
            if self.resources[index].data.is_none() {
                self.load(index, source)?;
            }
        }
        Ok(())
    }

    /// Serialize every resource with the write plugin
    ///
    /// All resources must be loaded; see [`Archive::load_all`].
    pub fn write_to(&mut self, out: &mut dyn Write) -> PluginResult<()> {
        let plugin = Arc::clone(self.write_plugin());
        plugin.write(&mut self.resources, out)
    }

    /// Columns the read plugin describes
    pub fn columns(&self) -> Vec<Column> {
        self.read_plugin.columns()
    }

    /// Display value of one column of one resource
    pub fn column_value(&self, index: usize, column: char) -> Option<String> {
        let resource = self.resources.get(index)?;
        self.read_plugin.column_value(resource, column)
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("base_path", &self.base_path)
            .field("read_plugin", &self.read_plugin.info().code)
            .field("write_plugin", &self.write_plugin().info().code)
            .field("resources", &self.resources.len())
            .field("container_len", &self.container_len)
            .field("read_failure", &self.read_failure)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use crate::pak::PakPlugin;
    use crate::zip::ZipPlugin;
    use binrw::io::Cursor;
    use pretty_assertions::assert_eq;

    fn pak() -> (Archive, Cursor<Vec<u8>>) {
        let plugin: Arc<dyn ArchivePlugin> = Arc::new(PakPlugin::default());
        let mut resources = vec![
            Resource::from_data("maps/start.bsp", b"bsp".to_vec()),
            Resource::from_data("sound/misc/null.wav", b"wav!".to_vec()),
        ];
        let mut out = Vec::new();
        plugin.write(&mut resources, &mut out).unwrap();

        let mut cursor = Cursor::new(out);
        let report = plugin.read(&mut cursor);
        let len = cursor.get_ref().len() as u64;
        (Archive::new(plugin, report.resources, len), cursor)
    }

    #[test]
    fn test_find_ignores_case_and_separators() {
        let (archive, _) = pak();
        assert_eq!(archive.find("SOUND\\MISC\\NULL.WAV"), Some(1));
        assert_eq!(archive.find("missing"), None);
    }

    #[test]
    fn test_extract_and_load() {
        let (mut archive, mut cursor) = pak();
        assert_eq!(archive.extract(0, &mut cursor).unwrap(), b"bsp");
        assert!(archive.resource(0).unwrap().data().is_none());

        assert_eq!(archive.load(1, &mut cursor).unwrap(), b"wav!");
        assert_eq!(archive.resource(1).unwrap().data(), Some(&b"wav!"[..]));

        assert!(matches!(
            archive.extract(2, &mut cursor),
            Err(PluginError::NoSuchResource { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_write_with_other_plugin() {
        let (mut archive, mut cursor) = pak();
        archive.load_all(&mut cursor).unwrap();
        archive.set_write_plugin(Some(Arc::new(ZipPlugin::new(ExtractorConfig::default()))));
        assert_eq!(archive.write_plugin().info().code, "zip");

        let mut out = Vec::new();
        archive.write_to(&mut out).unwrap();
        assert_eq!(&out[..4], b"PK\x03\x04");

        let zip = ZipPlugin::default();
        let mut cursor = Cursor::new(out);
        let resources = zip.read(&mut cursor).into_result().unwrap();
        assert_eq!(resources[0].name, "maps/start.bsp");
        assert_eq!(zip.extract(&resources[1], &mut cursor).unwrap(), b"wav!");
    }

    #[test]
    fn test_write_needs_loaded_data() {
        let (mut archive, _) = pak();
        let err = archive.write_to(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, PluginError::MissingData(_)));
    }

    #[test]
    fn test_columns_follow_read_plugin() {
        let (archive, _) = pak();
        assert_eq!(archive.columns().len(), 7);
        assert_eq!(archive.column_value(0, 'P').as_deref(), Some("maps/start.bsp"));
        assert_eq!(archive.column_value(5, 'P'), None);
    }
}
