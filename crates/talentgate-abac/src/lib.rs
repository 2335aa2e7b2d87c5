//! # talentgate-abac: Attribute-Based Access Control
//!
//! Decides whether a subject may perform an action on a resource by comparing
//! subject attributes (role, department, clearance) against resource
//! attributes (owner, department, sensitivity).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  RequestState (trusted session attributes)   │
//! └─────────────────┬───────────────────────────┘
//!                   │ context::resolve_context
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  SubjectContext + ResourceDescriptor + Action│
//! └─────────────────┬───────────────────────────┘
//!                   │ evaluator::decide
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Decision                                    │
//! │  - Allow                                     │
//! │  - Deny(reason)                              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! | Action | Role      | Allowed when                                        |
//! |--------|-----------|-----------------------------------------------------|
//! | read   | recruiter | same department AND clearance >= sensitivity        |
//! | read   | candidate | subject owns the resource                           |
//! | write  | recruiter | clearance > sensitivity                             |
//! | delete | admin     | clearance >= 5                                      |
//!
//! Everything else is denied. The engine is pure: no I/O, no caching, and
//! identical inputs always produce identical decisions.
//!
//! ## Examples
//!
//! ```
//! use talentgate_abac::evaluator;
//! use talentgate_types::{
//!     Action, ClearanceLevel, Department, ResourceDescriptor, Role, SubjectContext, UserId,
//! };
//!
//! let recruiter = SubjectContext::new(
//!     Some(UserId::new("r-1")),
//!     Role::Recruiter,
//!     Department::new("eng"),
//!     ClearanceLevel::new(3),
//! );
//! let profile = ResourceDescriptor::new("candidate", "c-9")
//!     .with_department("eng")
//!     .with_sensitivity(2);
//!
//! assert!(evaluator::decide(&recruiter, &profile, Action::Read).is_allowed());
//! assert!(!evaluator::validate_abac_policy(&recruiter, &profile, "approve"));
//! ```

pub mod context;
pub mod evaluator;

pub use context::{RequestState, SessionKey, resolve_context};
pub use evaluator::{decide, decide_str, role_in, validate_abac_policy};
