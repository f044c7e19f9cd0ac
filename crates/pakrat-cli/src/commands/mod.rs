//! Command handlers

pub mod config;
pub mod derive_key;
pub mod extract;
pub mod hash;
pub mod list;
pub mod plugins;
pub mod rename;

use anyhow::{Context, Result};
use pakrat_formats::{ExtractorConfig, Session};
use std::path::Path;
use tracing::warn;

/// Open `path` in a fresh session, optionally forcing a plugin
pub(crate) fn open_session(
    path: &Path,
    plugin: Option<&str>,
    config: ExtractorConfig,
) -> Result<Session> {
    let mut session = Session::new(config);
    let archive = match plugin {
        Some(code) => session.open_with(path, code),
        None => session.open(path),
    }
    .with_context(|| format!("failed to open {}", path.display()))?;

    if let Some(error) = archive.read_failure() {
        warn!(
            archive = %path.display(),
            resources = archive.len(),
            %error,
            "continuing with a partially read archive"
        );
    }

    Ok(session)
}
