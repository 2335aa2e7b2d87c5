//! Configuration error types

use talentgate_audit::AuditError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Failed to render configuration as TOML: {0}")]
    RenderError(#[from] toml::ser::Error),

    #[error("Failed to open audit trail: {0}")]
    AuditError(#[from] AuditError),

    #[error("XDG directory error: {0}")]
    XdgError(String),
}
