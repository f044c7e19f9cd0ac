//! `pakrat plugins`

use crate::OutputFormat;
use crate::output::{OutputStyle, create_table, header_cell};
use anyhow::Result;
use pakrat_formats::{ExtractorConfig, PluginRegistry};
use serde_json::json;

/// List the registered plugins
pub fn handle(format: OutputFormat, config: &ExtractorConfig) -> Result<()> {
    let registry = PluginRegistry::with_defaults(config);

    match format {
        OutputFormat::Json => {
            let plugins: Vec<_> = registry
                .plugins()
                .iter()
                .map(|plugin| {
                    let info = plugin.info();
                    json!({
                        "code": info.code,
                        "name": info.name,
                        "extensions": info.extensions,
                        "can_write": info.can_write,
                        "columns": plugin.columns(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&plugins)?);
        }
        OutputFormat::Text => {
            let style = OutputStyle::new();
            let mut table = create_table(&style);
            table.set_header(vec![
                header_cell("Code", &style),
                header_cell("Name", &style),
                header_cell("Extensions", &style),
                header_cell("Writable", &style),
            ]);
            for plugin in registry.plugins() {
                let info = plugin.info();
                table.add_row(vec![
                    info.code.to_string(),
                    info.name.to_string(),
                    info.extensions.join(", "),
                    if info.can_write { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
