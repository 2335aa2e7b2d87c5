//! Subject context resolution.
//!
//! The transport layer (cookies, headers, whatever the host application uses)
//! hands the core a [`RequestState`] built from *trusted* session storage.
//! [`resolve_context`] turns it into a [`SubjectContext`], degrading every
//! missing or malformed attribute to its least-privileged value. Resolution
//! never fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
pub use talentgate_types::UNKNOWN_SOURCE_ADDRESS;
use talentgate_types::{ClearanceLevel, Department, Role, SubjectContext, UserId};
use tracing::debug;

/// Session attribute names carried in trusted session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    UserId,
    Role,
    Department,
    ClearanceLevel,
}

impl SessionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::UserId => "userId",
            SessionKey::Role => "userRole",
            SessionKey::Department => "department",
            SessionKey::ClearanceLevel => "clearanceLevel",
        }
    }
}

/// Trusted per-request state supplied by the transport layer.
///
/// Never populate this from client-supplied request bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestState {
    session: BTreeMap<String, String>,
    source_address: Option<String>,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds request state from an existing session attribute map.
    pub fn from_session(session: BTreeMap<String, String>) -> Self {
        Self {
            session,
            source_address: None,
        }
    }

    /// Sets a session attribute.
    pub fn with(mut self, key: SessionKey, value: impl Into<String>) -> Self {
        self.session.insert(key.as_str().to_string(), value.into());
        self
    }

    /// Sets the client address reported by the transport layer.
    pub fn with_source_address(mut self, address: impl Into<String>) -> Self {
        self.source_address = Some(address.into());
        self
    }

    pub fn get(&self, key: SessionKey) -> Option<&str> {
        self.session.get(key.as_str()).map(String::as_str)
    }

    /// Client address, or `0.0.0.0` when unknown.
    pub fn source_address(&self) -> &str {
        self.source_address
            .as_deref()
            .filter(|addr| !addr.trim().is_empty())
            .unwrap_or(UNKNOWN_SOURCE_ADDRESS)
    }
}

/// Reconstructs the acting subject's attributes for this request.
///
/// Defaults:
/// - role: `candidate`
/// - department: unassigned (matches nothing)
/// - clearance: 1
/// - user id: none
pub fn resolve_context(state: &RequestState) -> SubjectContext {
    let user_id = non_blank(state.get(SessionKey::UserId)).map(UserId::new);
    if user_id.is_none() {
        debug!("session carries no user id; resolving as anonymous");
    }

    let role = match non_blank(state.get(SessionKey::Role)) {
        Some(raw) => Role::parse(raw).unwrap_or_else(|| {
            debug!(role = raw, "unrecognized session role; degrading to candidate");
            Role::Candidate
        }),
        None => {
            debug!("session carries no role; degrading to candidate");
            Role::Candidate
        }
    };

    let department = match non_blank(state.get(SessionKey::Department)) {
        Some(raw) => Department::new(raw),
        None => {
            debug!("session carries no department; resolving as unassigned");
            Department::Unassigned
        }
    };

    let clearance = match non_blank(state.get(SessionKey::ClearanceLevel)) {
        Some(raw) => raw.trim().parse::<u32>().map_or_else(
            |_| {
                debug!(clearance = raw, "malformed session clearance; using default");
                ClearanceLevel::DEFAULT
            },
            ClearanceLevel::new,
        ),
        None => ClearanceLevel::DEFAULT,
    };

    SubjectContext::new(user_id, role, department, clearance)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
