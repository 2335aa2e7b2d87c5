//! Configuration management for Talentgate
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (TG_* prefix)
//! 3. talentgate.local.toml (gitignored, local overrides)
//! 4. talentgate.toml (git-tracked, project config)
//! 5. ~/.config/talentgate/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use talentgate_audit::{AuditSink, AuditTrail, JsonLinesSink, MemorySink};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main Talentgate configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalentgateConfig {
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub sink: SinkKind,
    /// Trail file for the `json-lines` sink.
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::JsonLines,
            path: PathBuf::from(".talentgate/audit.jsonl"),
        }
    }
}

/// Where audit records are stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Process memory; lost on exit.
    Memory,
    /// One JSON object per line, appended and synced per record.
    JsonLines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl TalentgateConfig {
    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.audit.path.is_relative() {
            self.audit.path = base.join(&self.audit.path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.level must not be empty".to_string(),
            ));
        }
        if self.audit.sink == SinkKind::JsonLines && self.audit.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "audit.path is required for the json-lines sink".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the configured sink and opens the trail over it.
    pub fn open_trail(&self) -> Result<AuditTrail, ConfigError> {
        let sink: Arc<dyn AuditSink> = match self.audit.sink {
            SinkKind::Memory => Arc::new(MemorySink::new()),
            SinkKind::JsonLines => Arc::new(JsonLinesSink::open(&self.audit.path)?),
        };
        Ok(AuditTrail::open(sink)?)
    }

    /// The resolved configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
