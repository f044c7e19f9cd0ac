//! `pakrat list`

use crate::OutputFormat;
use crate::output::{OutputStyle, create_table, format_header, format_warning, header_cell};
use anyhow::{Context, Result};
use pakrat_formats::ExtractorConfig;
use serde_json::json;
use std::path::Path;

/// Print the resources of an archive
pub fn handle(
    path: &Path,
    plugin: Option<&str>,
    format: OutputFormat,
    config: ExtractorConfig,
) -> Result<()> {
    let session = super::open_session(path, plugin, config)?;
    let archive = session.current().context("no archive open")?;
    let info = archive.read_plugin().info();

    match format {
        OutputFormat::Json => {
            let report = json!({
                "archive": path.display().to_string(),
                "plugin": info.code,
                "complete": archive.is_complete(),
                "read_failure": archive.read_failure().map(ToString::to_string),
                "resources": archive.resources(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let style = OutputStyle::new();
            println!(
                "{}",
                format_header(
                    &format!(
                        "{} ({}, {} resources)",
                        path.display(),
                        info.name,
                        archive.len()
                    ),
                    &style
                )
            );

            let columns = archive.columns();
            let mut table = create_table(&style);
            let mut header = vec![header_cell("#", &style)];
            header.extend(columns.iter().map(|c| header_cell(c.name, &style)));
            table.set_header(header);

            for index in 0..archive.len() {
                let mut row = vec![index.to_string()];
                row.extend(
                    columns
                        .iter()
                        .map(|c| archive.column_value(index, c.code).unwrap_or_default()),
                );
                table.add_row(row);
            }
            println!("{table}");

            if let Some(error) = archive.read_failure() {
                println!(
                    "{}",
                    format_warning(&format!("Archive only partially read: {error}"), &style)
                );
            }
        }
    }

    Ok(())
}
