//! `pakrat rename`

use crate::output::{OutputStyle, format_success};
use anyhow::{Context, Result, bail};
use pakrat_formats::{ExtractorConfig, PluginError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Options for [`handle`]
#[derive(Debug, Clone, Copy)]
pub struct RenameRequest<'a> {
    /// Source archive
    pub archive: &'a Path,
    /// Resource to rename
    pub index: usize,
    /// Its new name
    pub new_name: &'a str,
    /// Where to write the rewritten archive
    pub output: &'a Path,
    /// Plugin used to read the source
    pub plugin: Option<&'a str>,
    /// Plugin used to write the output; defaults to the reading plugin
    pub to: Option<&'a str>,
    /// Rewrite a partially read archive anyway
    pub force: bool,
}

/// Rename one resource and write the archive to a new file
pub fn handle(request: RenameRequest<'_>, config: ExtractorConfig) -> Result<()> {
    let mut session = super::open_session(request.archive, request.plugin, config)?;
    let target = request
        .to
        .map(|code| {
            session
                .registry()
                .by_code(code)
                .ok_or_else(|| PluginError::UnknownPlugin(code.to_string()))
        })
        .transpose()?;

    let archive = session.current().context("no archive open")?;
    if let Some(failure) = archive.read_failure() {
        if !request.force {
            bail!(
                "{} was only partially read ({failure}); rewriting would drop entries, \
                 use --force to do it anyway",
                request.archive.display()
            );
        }
        warn!(%failure, "rewriting a partially read archive");
    }

    session.load_all().context("failed to load resources")?;
    let archive = session.current_mut().context("no archive open")?;

    let len = archive.len();
    let resource = archive
        .resources_mut()
        .get_mut(request.index)
        .ok_or(PluginError::NoSuchResource {
            index: request.index,
            len,
        })?;
    let old_name = resource.name.clone();
    resource.rename(request.new_name);
    info!(from = %old_name, to = request.new_name, "renamed resource");

    if target.is_some() {
        archive.set_write_plugin(target);
    }
    let code = archive.write_plugin().info().code;

    let file = File::create(request.output)
        .with_context(|| format!("failed to create {}", request.output.display()))?;
    let mut out = BufWriter::new(file);
    archive
        .write_to(&mut out)
        .with_context(|| format!("failed to write {code} archive"))?;
    out.flush()?;

    let style = OutputStyle::new();
    println!(
        "{}",
        format_success(
            &format!(
                "Renamed {old_name} to {} and wrote {} ({code})",
                request.new_name,
                request.output.display()
            ),
            &style
        )
    );
    Ok(())
}
