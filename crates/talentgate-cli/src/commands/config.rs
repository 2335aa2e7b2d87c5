//! Configuration management commands.

use anyhow::Result;
use talentgate_config::TalentgateConfig;

/// Print the resolved configuration as TOML.
pub fn show(config: &TalentgateConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
