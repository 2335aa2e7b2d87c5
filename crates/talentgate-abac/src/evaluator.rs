//! ABAC policy evaluation engine.
//!
//! Evaluates one access request against the fixed rule table. Rules are keyed
//! by action, then by role. Any combination the table does not grant is a
//! deny; the engine has no error path for well-formed input.

use talentgate_types::{
    Action, ClearanceLevel, Decision, DenyReason, ResourceDescriptor, Role, SubjectContext,
};
use tracing::trace;

// ============================================================================
// Public API
// ============================================================================

/// Decides whether `subject` may perform `action` on `resource`.
///
/// # Postcondition
///
/// Always returns a `Decision`, never panics.
pub fn decide(subject: &SubjectContext, resource: &ResourceDescriptor, action: Action) -> Decision {
    let decision = match action {
        Action::Read => decide_read(subject, resource),
        Action::Write => decide_write(subject, resource),
        Action::Delete => decide_delete(subject),
    };

    trace!(
        actor = subject.actor(),
        role = %subject.role(),
        action = %action,
        resource = %resource.key(),
        allowed = decision.is_allowed(),
        "ABAC decision"
    );

    decision
}

/// Like [`decide`], for an action that arrives as a string.
///
/// An unrecognized action is a deny, not an error.
pub fn decide_str(subject: &SubjectContext, resource: &ResourceDescriptor, action: &str) -> Decision {
    match action.parse::<Action>() {
        Ok(action) => decide(subject, resource, action),
        Err(unknown) => Decision::Deny(DenyReason::UnrecognizedAction(unknown.0)),
    }
}

/// Boolean form of [`decide_str`].
pub fn validate_abac_policy(
    subject: &SubjectContext,
    resource: &ResourceDescriptor,
    action: &str,
) -> bool {
    decide_str(subject, resource, action).is_allowed()
}

/// Coarse role-membership gate, used before any resource lookup.
///
/// An empty `allowed` set denies every role.
pub fn role_in(subject: &SubjectContext, allowed: &[Role]) -> Decision {
    let role = subject.role();
    Decision::allow_if(allowed.contains(&role), || DenyReason::RoleNotInSet {
        role,
        allowed: allowed.to_vec(),
    })
}

// ============================================================================
// Rules
// ============================================================================

fn decide_read(subject: &SubjectContext, resource: &ResourceDescriptor) -> Decision {
    match subject.role() {
        Role::Recruiter => {
            if !subject.department().matches(&resource.department) {
                return Decision::Deny(DenyReason::DepartmentMismatch);
            }
            Decision::allow_if(subject.clearance().covers(resource.sensitivity), || {
                DenyReason::InsufficientClearance {
                    clearance: subject.clearance(),
                    required: resource.sensitivity.get(),
                }
            })
        }
        Role::Candidate => Decision::allow_if(owns(subject, resource), || DenyReason::NotOwner),
        role @ (Role::Admin | Role::Interviewer) => Decision::Deny(DenyReason::RoleNotPermitted {
            role,
            action: Action::Read,
        }),
    }
}

fn decide_write(subject: &SubjectContext, resource: &ResourceDescriptor) -> Decision {
    match subject.role() {
        Role::Recruiter => Decision::allow_if(subject.clearance().exceeds(resource.sensitivity), || {
            DenyReason::ClearanceMarginRequired {
                clearance: subject.clearance(),
                sensitivity: resource.sensitivity,
            }
        }),
        role @ (Role::Candidate | Role::Admin | Role::Interviewer) => {
            Decision::Deny(DenyReason::RoleNotPermitted {
                role,
                action: Action::Write,
            })
        }
    }
}

fn decide_delete(subject: &SubjectContext) -> Decision {
    match subject.role() {
        Role::Admin => Decision::allow_if(
            subject.clearance() >= ClearanceLevel::MAX_THRESHOLD,
            || DenyReason::InsufficientClearance {
                clearance: subject.clearance(),
                required: ClearanceLevel::MAX_THRESHOLD.get(),
            },
        ),
        role @ (Role::Candidate | Role::Recruiter | Role::Interviewer) => {
            Decision::Deny(DenyReason::RoleNotPermitted {
                role,
                action: Action::Delete,
            })
        }
    }
}

/// Ownership requires a known, non-empty id on both sides.
fn owns(subject: &SubjectContext, resource: &ResourceDescriptor) -> bool {
    match (subject.user_id(), resource.owner.as_ref()) {
        (Some(user), Some(owner)) => !user.is_empty() && user == owner,
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
