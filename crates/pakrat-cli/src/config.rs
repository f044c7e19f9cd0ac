//! Loading [`ExtractorConfig`] from TOML

use pakrat_formats::config::ExtractorConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name inside the configuration directory
pub const CONFIG_FILE: &str = "pakrat.toml";

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not valid TOML for the configuration
    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
    /// The configuration could not be rendered
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// `<config dir>/pakrat/pakrat.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pakrat")
        .join(CONFIG_FILE)
}

/// Parse a configuration document; missing keys take their defaults
pub fn parse_config(content: &str) -> Result<ExtractorConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load the configuration
///
/// An explicit `path` must exist. Without one, the default path is used if
/// it exists and the built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<ExtractorConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path();
            if !path.exists() {
                debug!(path = %path.display(), "no configuration file, using defaults");
                return Ok(ExtractorConfig::default());
            }
            path
        }
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "loaded configuration");
    parse_config(&content)
}

/// Render a configuration as TOML
pub fn render_config(config: &ExtractorConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_partial_document() {
        let config = parse_config(
            r#"
max_resource_size = 4096

[mpq]
extra_names = ["war3map.j", "war3map.w3e"]
encrypt_on_write = true
"#,
        )
        .unwrap();

        assert_eq!(config.max_resource_size, 4096);
        assert!(config.verify_checksums);
        assert_eq!(config.mpq.extra_names.len(), 2);
        assert!(config.mpq.encrypt_on_write);
        assert_eq!(config.mpq.sector_size_shift, 3);
    }

    #[test]
    fn test_render_round_trips() {
        let config = ExtractorConfig::default().with_verify_checksums(false);
        let rendered = render_config(&config).unwrap();
        assert_eq!(parse_config(&rendered).unwrap(), config);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[zip]\ncompress_on_write = false\n").unwrap();
        assert!(!load_config(Some(&path)).unwrap().zip.compress_on_write);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            parse_config("max_resource_size = \"big\""),
            Err(ConfigError::TomlDeserialize(_))
        ));
    }
}
