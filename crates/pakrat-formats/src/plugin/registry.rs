//! Explicit plugin lookup table

use super::{ArchivePlugin, Probe, Rating};
use crate::config::ExtractorConfig;
use crate::mpq::MpqPlugin;
use crate::pak::PakPlugin;
use crate::zip::ZipPlugin;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registered plugins, indexed by code and by extension
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn ArchivePlugin>>,
    by_extension: HashMap<String, Vec<usize>>,
}

impl PluginRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in plugin
    pub fn with_defaults(config: &ExtractorConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MpqPlugin::new(config.clone())));
        registry.register(Arc::new(ZipPlugin::new(config.clone())));
        registry.register(Arc::new(PakPlugin::new(config.clone())));
        registry
    }

    /// Add a plugin; a plugin with the same code is replaced
    pub fn register(&mut self, plugin: Arc<dyn ArchivePlugin>) {
        let code = plugin.info().code;
        if let Some(index) = self.plugins.iter().position(|p| p.info().code == code) {
            self.plugins[index] = plugin;
        } else {
            self.plugins.push(plugin);
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        self.by_extension.clear();
        for (index, plugin) in self.plugins.iter().enumerate() {
            for ext in plugin.info().extensions {
                self.by_extension
                    .entry((*ext).to_string())
                    .or_default()
                    .push(index);
            }
        }
    }

    /// All plugins in registration order
    pub fn plugins(&self) -> &[Arc<dyn ArchivePlugin>] {
        &self.plugins
    }

    /// Plugin with the given code (case-insensitive)
    pub fn by_code(&self, code: &str) -> Option<Arc<dyn ArchivePlugin>> {
        self.plugins
            .iter()
            .find(|p| p.info().code.eq_ignore_ascii_case(code))
            .cloned()
    }

    /// Plugins that list `extension`
    pub fn by_extension(&self, extension: &str) -> Vec<Arc<dyn ArchivePlugin>> {
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(|indices| indices.iter().map(|&i| Arc::clone(&self.plugins[i])).collect())
            .unwrap_or_default()
    }

    /// Every plugin that claims the probe, best rating first
    ///
    /// Ties keep registration order.
    pub fn detect(&self, probe: &Probe) -> Vec<(Rating, Arc<dyn ArchivePlugin>)> {
        let mut matches: Vec<_> = self
            .plugins
            .iter()
            .map(|plugin| (plugin.rate(probe), Arc::clone(plugin)))
            .filter(|(rating, _)| rating.is_match())
            .collect();
        matches.sort_by(|a, b| b.0.cmp(&a.0));

        for (rating, plugin) in &matches {
            debug!(plugin = plugin.info().code, rating = rating.0, "plugin claims container");
        }
        matches
    }

    /// Best-rated plugin for the probe
    pub fn select(&self, probe: &Probe) -> Option<Arc<dyn ArchivePlugin>> {
        self.detect(probe).into_iter().next().map(|(_, plugin)| plugin)
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugins are registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.info().code))
            .finish()
    }
}
