//! Append-only audit trail for authorization decisions.
//!
//! Every decision the authorization gateway makes, and every notable
//! security event (sign-in, sign-up, new device), is recorded here as an
//! immutable [`AuditRecord`].
//!
//! # Architecture
//!
//! ```text
//! AuditTrail = {
//!     sink: Arc<dyn AuditSink>,          // memory, JSON lines, ...
//!     head: Mutex<ChainHead>,            // next sequence + last hash
//!     append(entry) -> AuditRecord,
//!     query(filter) -> Vec<AuditRecord>,
//!     verify_chain() -> usize,
//! }
//! ```
//!
//! The trail is append-only: the public API has no update or delete
//! operation. Records carry a gap-free `sequence` and a SHA-256 hash chain
//! (`hash = SHA-256(prev_hash || canonical(record))`), so any later edit of
//! stored history is detected by [`AuditTrail::verify_chain`].
//!
//! # Example
//!
//! ```
//! use talentgate_audit::{AuditEntry, AuditQuery, AuditTrail};
//! use talentgate_types::{AuditStatus, ResourceKey, SubjectContext};
//!
//! let trail = AuditTrail::in_memory();
//!
//! trail.append(
//!     AuditEntry::new(
//!         "signin",
//!         ResourceKey::new("user:ada@example.com"),
//!         AuditStatus::Success,
//!         SubjectContext::least_privileged(),
//!     )
//!     .with_details("User authenticated"),
//! )?;
//!
//! let results = trail.query(&AuditQuery::default().with_search("ada@"))?;
//! assert_eq!(results.len(), 1);
//! assert_eq!(trail.verify_chain()?, 1);
//! # Ok::<(), talentgate_audit::AuditError>(())
//! ```

use thiserror::Error;

pub mod query;
pub mod record;
pub mod sink;
pub mod trail;

pub use query::AuditQuery;
pub use record::{AuditEntry, AuditRecord, ChainHash};
pub use sink::{AuditSink, JsonLinesSink, MemorySink};
pub use trail::AuditTrail;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit sink unavailable: {0}")]
    Sink(String),

    #[error("Audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Canonical encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("Corrupted audit record at line {line}: {reason}")]
    Corrupted { line: usize, reason: String },

    #[error("Audit chain broken at sequence {sequence}: {reason}")]
    ChainBroken { sequence: u64, reason: String },

    #[error("Audit trail lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, AuditError>;
