//! Configuration loader with multi-source merging

use crate::{Paths, TalentgateConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment overrides (`TG_AUDIT_SINK`, `TG_LOGGING_LEVEL`, ...).
const ENV_PREFIX: &str = "TG";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
}

impl ConfigLoader {
    /// Loader rooted at the current directory
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<TalentgateConfig> {
        let mut builder = config::Config::builder();

        // 1. Built-in defaults
        let defaults = TalentgateConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/talentgate/config.toml)
        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                debug!(path = %user_config_file.display(), "Loading user config");
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        // 3. Project config (talentgate.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            debug!(path = %project_config_file.display(), "Loading project config");
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (talentgate.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            debug!(path = %local_config_file.display(), "Loading local config");
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (TG_AUDIT_SINK, TG_LOGGING_LEVEL, ...)
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut talentgate_config: TalentgateConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        talentgate_config.resolve_paths(&self.project_dir);
        talentgate_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(talentgate_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
