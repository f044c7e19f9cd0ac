//! `pakrat extract`

use crate::OutputFormat;
use crate::output::{OutputStyle, format_success};
use anyhow::{Context, Result, bail};
use pakrat_formats::ExtractorConfig;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Map a resource name to a relative path that stays under the output
/// directory
///
/// Both separators are accepted. Empty, `.` and `..` components and drive
/// prefixes are dropped. Returns `None` when nothing is left.
pub fn sanitize_path(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." | ".." => {}
            part if part.ends_with(':') => {}
            part => path.push(part),
        }
    }
    (!path.as_os_str().is_empty()).then_some(path)
}

/// Extract every resource whose name contains `filter` into `out_dir`
pub fn handle(
    path: &Path,
    out_dir: &Path,
    filter: Option<&str>,
    plugin: Option<&str>,
    format: OutputFormat,
    config: ExtractorConfig,
) -> Result<()> {
    let mut session = super::open_session(path, plugin, config)?;
    let names: Vec<(usize, String)> = session
        .current()
        .context("no archive open")?
        .resources()
        .iter()
        .enumerate()
        .map(|(index, resource)| (index, resource.name.clone()))
        .collect();

    let filter = filter.map(str::to_ascii_lowercase);
    let mut written = 0usize;
    let mut failed = 0usize;

    for (index, name) in names {
        if let Some(filter) = &filter {
            if !name.to_ascii_lowercase().contains(filter.as_str()) {
                continue;
            }
        }

        let Some(relative) = sanitize_path(&name) else {
            warn!(%name, "skipping resource without a usable path");
            failed += 1;
            continue;
        };
        let target = out_dir.join(relative);

        let result = session
            .extract(index)
            .map_err(anyhow::Error::from)
            .and_then(|data| write_file(&target, &data));
        match result {
            Ok(()) => {
                debug!(%name, target = %target.display(), "extracted");
                written += 1;
            }
            Err(error) => {
                warn!(%name, %error, "extraction failed");
                failed += 1;
            }
        }
    }

    match format {
        OutputFormat::Json => {
            let summary = json!({
                "archive": path.display().to_string(),
                "output": out_dir.display().to_string(),
                "written": written,
                "failed": failed,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            let style = OutputStyle::new();
            println!(
                "{}",
                format_success(
                    &format!("Extracted {written} resources to {}", out_dir.display()),
                    &style
                )
            );
        }
    }

    if failed > 0 {
        bail!("{failed} resources could not be extracted");
    }
    Ok(())
}

fn write_file(target: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(target, data).with_context(|| format!("failed to write {}", target.display()))
}
