use talentgate_audit::AuditError;
use talentgate_types::{AuditStatus, DenyReason};
use thiserror::Error;

/// Why the gateway did not issue a permit.
///
/// Every variant except [`AuthzError::Audit`] has already been recorded in
/// the audit trail when it is returned.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The policy denied the request. The reason stays server-side; callers
    /// only see "Insufficient permissions".
    #[error("Insufficient permissions")]
    Denied { reason: DenyReason },

    /// The requested action is not one the policy knows.
    #[error("Unrecognized action: {action}")]
    MalformedAction { action: String },

    /// The decision could not be recorded, so it was not honored.
    #[error("Audit trail unavailable: {0}")]
    Audit(#[from] AuditError),
}

impl AuthzError {
    /// Status recorded (or attempted) for this outcome.
    pub fn status(&self) -> AuditStatus {
        match self {
            AuthzError::Denied { .. } => AuditStatus::Denied,
            AuthzError::MalformedAction { .. } | AuthzError::Audit(_) => AuditStatus::Error,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AuthzError::Denied { .. })
    }

    /// Server-side denial reason, for logs and audit details.
    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            AuthzError::Denied { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
