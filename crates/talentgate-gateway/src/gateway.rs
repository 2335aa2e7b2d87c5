//! The single entry point guarded operations call before doing any work.

use std::sync::Arc;

use talentgate_abac::{RequestState, decide_str, resolve_context, role_in};
use talentgate_audit::{AuditEntry, AuditRecord, AuditTrail};
use talentgate_types::{
    AuditStatus, Decision, DenyReason, ResourceDescriptor, ResourceKey, Role, SubjectContext,
    join_roles,
};
use tracing::{error, info, warn};

use crate::error::{AuthzError, Result};

/// Audit verb for a coarse role check that passed.
pub const ACCESS_GRANTED: &str = "access_granted";

/// Audit verb for a coarse role check that failed.
pub const ACCESS_DENIED: &str = "access_denied";

/// What a guarded operation requires of its caller.
#[derive(Debug, Clone, Copy)]
pub enum Requirement<'a> {
    /// Coarse gate: the subject's role must be one of `roles`.
    AnyRole {
        roles: &'a [Role],
        resource: &'a ResourceKey,
    },
    /// Fine-grained check of `action` against the resource's attributes.
    Policy {
        resource: &'a ResourceDescriptor,
        action: &'a str,
    },
}

/// Proof that a request was allowed and the decision recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permit {
    context: SubjectContext,
    audit_sequence: u64,
}

impl Permit {
    /// The subject context the decision was made for.
    pub fn context(&self) -> &SubjectContext {
        &self.context
    }

    /// Sequence number of the audit record for this decision.
    pub fn audit_sequence(&self) -> u64 {
        self.audit_sequence
    }
}

/// Evaluated requirement, ready to be recorded.
struct Evaluation {
    resource: ResourceKey,
    decision: Decision,
    details: Option<String>,
}

/// Authorization gateway.
///
/// Each call resolves the subject context, evaluates the requirement, and
/// appends exactly one audit record before returning. Nothing is cached
/// between calls. If the record cannot be written the request is rejected.
#[derive(Debug, Clone)]
pub struct AuthorizationGateway {
    trail: Arc<AuditTrail>,
}

impl AuthorizationGateway {
    pub fn new(trail: Arc<AuditTrail>) -> Self {
        Self { trail }
    }

    pub fn trail(&self) -> &Arc<AuditTrail> {
        &self.trail
    }

    /// Authorizes one request, recording the outcome under `verb`.
    ///
    /// # Errors
    ///
    /// - [`AuthzError::Denied`] when the policy denies (status `denied`)
    /// - [`AuthzError::MalformedAction`] for an unknown action (status `error`)
    /// - [`AuthzError::Audit`] when the decision could not be recorded
    pub fn authorize(
        &self,
        request: &RequestState,
        verb: &str,
        requirement: Requirement<'_>,
    ) -> Result<Permit> {
        self.enforce(request, verb, verb, requirement, None)
    }

    /// Coarse role gate for a guarded operation.
    ///
    /// Recorded as `access_granted` or `access_denied` with details naming the
    /// subject's role and the allowed set.
    pub fn require_permission(
        &self,
        request: &RequestState,
        roles: &[Role],
        resource: &ResourceKey,
    ) -> Result<Permit> {
        self.enforce(
            request,
            ACCESS_GRANTED,
            ACCESS_DENIED,
            Requirement::AnyRole { roles, resource },
            None,
        )
    }

    /// Fine-grained policy check, recorded under the operation's own verb.
    pub fn check_policy(
        &self,
        request: &RequestState,
        verb: &str,
        resource: &ResourceDescriptor,
        action: &str,
    ) -> Result<Permit> {
        self.enforce(
            request,
            verb,
            verb,
            Requirement::Policy { resource, action },
            None,
        )
    }

    /// Like [`check_policy`](Self::check_policy), with `details` describing
    /// the operation (e.g. `Moved to interview`) recorded when it is allowed.
    ///
    /// Denials keep the policy violation as their details.
    pub fn check_policy_with_details(
        &self,
        request: &RequestState,
        verb: &str,
        resource: &ResourceDescriptor,
        action: &str,
        details: &str,
    ) -> Result<Permit> {
        self.enforce(
            request,
            verb,
            verb,
            Requirement::Policy { resource, action },
            Some(details),
        )
    }

    /// Records an event outside the decision path (sign-in, sign-up, ...).
    pub fn audit_action(
        &self,
        request: &RequestState,
        verb: &str,
        resource: ResourceKey,
        status: AuditStatus,
        details: Option<&str>,
    ) -> Result<AuditRecord> {
        let context = resolve_context(request);
        let mut entry = AuditEntry::new(verb, resource, status, context)
            .with_source_address(request.source_address());
        if let Some(details) = details {
            entry = entry.with_details(details);
        }
        self.trail.append(entry).map_err(|e| {
            error!(action = verb, error = %e, "Failed to record audit event");
            AuthzError::Audit(e)
        })
    }

    fn enforce(
        &self,
        request: &RequestState,
        granted_verb: &str,
        denied_verb: &str,
        requirement: Requirement<'_>,
        success_details: Option<&str>,
    ) -> Result<Permit> {
        let context = resolve_context(request);
        let Evaluation {
            resource,
            decision,
            details,
        } = evaluate(&context, requirement, success_details);

        let status = match decision.reason() {
            None => AuditStatus::Success,
            Some(DenyReason::UnrecognizedAction(_)) => AuditStatus::Error,
            Some(_) => AuditStatus::Denied,
        };
        let verb = if decision.is_allowed() {
            granted_verb
        } else {
            denied_verb
        };

        let mut entry = AuditEntry::new(verb, resource.clone(), status, context.clone())
            .with_source_address(request.source_address());
        if let Some(details) = details {
            entry = entry.with_details(details);
        }

        let record = match self.trail.append(entry) {
            Ok(record) => record,
            Err(e) => {
                error!(
                    actor = context.actor(),
                    action = verb,
                    resource = %resource,
                    error = %e,
                    "Audit write failed; rejecting request"
                );
                self.record_audit_failure(request, verb, &resource, &context);
                return Err(AuthzError::Audit(e));
            }
        };

        match decision {
            Decision::Allow => {
                info!(
                    actor = context.actor(),
                    role = %context.role(),
                    action = verb,
                    resource = %resource,
                    "Access granted"
                );
                Ok(Permit {
                    context,
                    audit_sequence: record.sequence(),
                })
            }
            Decision::Deny(DenyReason::UnrecognizedAction(action)) => {
                warn!(
                    actor = context.actor(),
                    action = %action,
                    resource = %resource,
                    "Unrecognized action rejected"
                );
                Err(AuthzError::MalformedAction { action })
            }
            Decision::Deny(reason) => {
                warn!(
                    actor = context.actor(),
                    role = %context.role(),
                    action = verb,
                    resource = %resource,
                    reason = %reason,
                    "Access denied"
                );
                Err(AuthzError::Denied { reason })
            }
        }
    }

    /// One attempt to leave an `error` record behind after a failed write.
    fn record_audit_failure(
        &self,
        request: &RequestState,
        verb: &str,
        resource: &ResourceKey,
        context: &SubjectContext,
    ) {
        let entry = AuditEntry::new(verb, resource.clone(), AuditStatus::Error, context.clone())
            .with_source_address(request.source_address())
            .with_details("Audit write failed; request rejected");
        if let Err(e) = self.trail.append(entry) {
            error!(action = verb, error = %e, "Audit failure could not be recorded");
        }
    }
}

fn evaluate(
    context: &SubjectContext,
    requirement: Requirement<'_>,
    success_details: Option<&str>,
) -> Evaluation {
    match requirement {
        Requirement::AnyRole { roles, resource } => {
            let decision = role_in(context, roles);
            let details = match (decision.reason(), success_details) {
                (None, Some(details)) => details.to_string(),
                (None, None) => format!("Role {} in {}", context.role(), join_roles(roles)),
                (Some(reason), _) => reason.to_string(),
            };
            Evaluation {
                resource: resource.clone(),
                decision,
                details: Some(details),
            }
        }
        Requirement::Policy { resource, action } => {
            let decision = decide_str(context, resource, action);
            let details = match decision.reason() {
                None => success_details.map(str::to_string),
                Some(DenyReason::UnrecognizedAction(action)) => {
                    Some(format!("Unrecognized action: {action}"))
                }
                Some(reason) => Some(format!("ABAC policy violation: {reason}")),
            };
            Evaluation {
                resource: resource.key(),
                decision,
                details,
            }
        }
    }
}
