//! `pakrat config`

use crate::config::render_config;
use anyhow::Result;
use pakrat_formats::ExtractorConfig;

/// Print the effective configuration as TOML
pub fn handle(config: &ExtractorConfig) -> Result<()> {
    print!("{}", render_config(config)?);
    Ok(())
}
