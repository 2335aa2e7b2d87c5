//! Talentgate authorization gateway.
//!
//! Ties the policy engine, context resolver and audit trail together. A
//! guarded operation calls the gateway first and only proceeds on a
//! [`Permit`]:
//!
//! ```text
//! request ──► resolve_context ──► role_in / decide ──► AuditTrail::append ──► Permit | AuthzError
//! ```
//!
//! The audit record is written before the caller learns the decision. If
//! it cannot be written, the request is rejected even when the policy
//! would have allowed it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use talentgate_abac::{RequestState, SessionKey};
//! use talentgate_audit::AuditTrail;
//! use talentgate_gateway::AuthorizationGateway;
//! use talentgate_types::{ResourceDescriptor, ResourceKey, Role};
//!
//! let gateway = AuthorizationGateway::new(Arc::new(AuditTrail::in_memory()));
//! let request = RequestState::new()
//!     .with(SessionKey::UserId, "r-42")
//!     .with(SessionKey::Role, "recruiter")
//!     .with(SessionKey::Department, "engineering")
//!     .with(SessionKey::ClearanceLevel, "3");
//!
//! gateway.require_permission(&request, &[Role::Recruiter, Role::Admin], &ResourceKey::new("candidate"))?;
//!
//! let candidate = ResourceDescriptor::new("candidate", "c-7")
//!     .with_department("engineering")
//!     .with_sensitivity(2);
//! let permit = gateway.check_policy(&request, "update_candidate_stage", &candidate, "write")?;
//! assert_eq!(permit.audit_sequence(), 1);
//! # Ok::<(), talentgate_gateway::AuthzError>(())
//! ```

mod error;
mod gateway;
pub mod signin;

pub use error::{AuthzError, Result};
pub use gateway::{ACCESS_DENIED, ACCESS_GRANTED, AuthorizationGateway, Permit, Requirement};
pub use signin::{SignInOutcome, record_auth_failure, record_sign_in, record_sign_up};
