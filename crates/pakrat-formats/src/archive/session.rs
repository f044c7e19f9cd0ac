//! Explicit "current archive" context

use super::Archive;
use crate::config::ExtractorConfig;
use crate::plugin::{
    ArchivePlugin, PluginError, PluginRegistry, PluginResult, Probe, ReadReport, ReadSeek,
};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

type Source = Box<dyn ReadSeek + Send>;

/// Holds at most one open archive and the source it reads from
///
/// Opening a container replaces the current archive wholesale. A failed
/// open leaves the previous archive in place.
pub struct Session {
    registry: PluginRegistry,
    config: ExtractorConfig,
    current: Option<(Archive, Source)>,
}

impl Session {
    /// Session with every built-in plugin
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_registry(PluginRegistry::with_defaults(&config), config)
    }

    /// Session over a custom registry
    pub fn with_registry(registry: PluginRegistry, config: ExtractorConfig) -> Self {
        Self {
            registry,
            config,
            current: None,
        }
    }

    /// Registered plugins
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Open a file, picking the best-rated plugin
    pub fn open(&mut self, path: &Path) -> PluginResult<&mut Archive> {
        self.open_path(path, None)
    }

    /// Open a file with the plugin registered under `code`
    pub fn open_with(&mut self, path: &Path, code: &str) -> PluginResult<&mut Archive> {
        self.open_path(path, Some(code))
    }

    fn open_path(&mut self, path: &Path, code: Option<&str>) -> PluginResult<&mut Archive> {
        let file = BufReader::new(File::open(path)?);
        self.open_reader(Some(path), file, code)
    }

    /// Open any seekable source
    ///
    /// `name` supplies the extension used during detection and is recorded
    /// as the archive's base path.
    pub fn open_reader<R>(
        &mut self,
        name: Option<&Path>,
        reader: R,
        code: Option<&str>,
    ) -> PluginResult<&mut Archive>
    where
        R: ReadSeek + Send + 'static,
    {
        let mut source: Source = Box::new(reader);
        let probe = Probe::from_reader(&mut *source, name)?;
        let label = name.map_or_else(|| "<stream>".to_string(), |p| p.display().to_string());

        let plugin = self.choose(&probe, code, &label)?;
        let ReadReport {
            resources,
            failure,
            skipped,
        } = plugin.read(&mut *source);
        source.seek(SeekFrom::Start(0))?;

        let failure = match failure {
            Some(error) if resources.is_empty() => return Err(error),
            other => other,
        };
        if let Some(error) = &failure {
            warn!(
                archive = %label,
                read = resources.len(),
                skipped,
                %error,
                "archive only partially read"
            );
        }

        info!(
            archive = %label,
            plugin = plugin.info().code,
            resources = resources.len(),
            "opened archive"
        );

        let mut archive = Archive::new(plugin, resources, probe.len).with_read_failure(failure);
        if let Some(path) = name {
            archive = archive.with_base_path(path);
        }
        let (archive, _) = self.current.insert((archive, source));
        Ok(archive)
    }

    fn choose(
        &self,
        probe: &Probe,
        code: Option<&str>,
        label: &str,
    ) -> PluginResult<Arc<dyn ArchivePlugin>> {
        match code {
            Some(code) => self
                .registry
                .by_code(code)
                .ok_or_else(|| PluginError::UnknownPlugin(code.to_string())),
            None => self
                .registry
                .select(probe)
                .ok_or_else(|| PluginError::Unrecognized(label.to_string())),
        }
    }

    /// Drop the current archive
    pub fn close(&mut self) {
        if let Some((archive, _)) = self.current.take() {
            info!(resources = archive.len(), "closed archive");
        }
    }

    /// The current archive
    pub fn current(&self) -> Option<&Archive> {
        self.current.as_ref().map(|(archive, _)| archive)
    }

    /// The current archive, mutably
    pub fn current_mut(&mut self) -> Option<&mut Archive> {
        self.current.as_mut().map(|(archive, _)| archive)
    }

    fn open_parts(&mut self) -> PluginResult<(&mut Archive, &mut Source)> {
        self.current
            .as_mut()
            .map(|(archive, source)| (archive, source))
            .ok_or(PluginError::NoArchiveOpen)
    }

    /// Decode one resource of the current archive
    pub fn extract(&mut self, index: usize) -> PluginResult<Vec<u8>> {
        let (archive, source) = self.open_parts()?;
        archive.extract(index, &mut **source)
    }

    /// Cache the decoded bytes of every resource of the current archive
    pub fn load_all(&mut self) -> PluginResult<()> {
        let (archive, source) = self.open_parts()?;
        archive.load_all(&mut **source)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("registry", &self.registry)
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}
