//! Evaluate one access request from the command line.

use std::sync::Arc;

use anyhow::Result;
use talentgate_abac::{RequestState, SessionKey, decide_str, resolve_context};
use talentgate_config::TalentgateConfig;
use talentgate_gateway::{AuthorizationGateway, AuthzError};
use talentgate_types::ResourceDescriptor;

use crate::style::print_hint;

/// Subject attributes as they would appear in session state.
pub struct SubjectArgs {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub clearance: Option<String>,
}

impl SubjectArgs {
    fn into_request(self) -> RequestState {
        let mut request = RequestState::new();
        let pairs = [
            (SessionKey::UserId, self.user_id),
            (SessionKey::Role, self.role),
            (SessionKey::Department, self.department),
            (SessionKey::ClearanceLevel, self.clearance),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                request = request.with(key, value);
            }
        }
        request
    }
}

/// Prints `ALLOW` or `DENY: {reason}`.
///
/// With `audit_verb`, the request goes through the gateway and the decision
/// is recorded in the configured trail.
pub fn run(
    config: &TalentgateConfig,
    subject: SubjectArgs,
    resource: &ResourceDescriptor,
    action: &str,
    audit_verb: Option<&str>,
) -> Result<()> {
    let request = subject.into_request();

    let Some(verb) = audit_verb else {
        let decision = decide_str(&resolve_context(&request), resource, action);
        match decision.reason() {
            None => println!("ALLOW"),
            Some(reason) => println!("DENY: {reason}"),
        }
        return Ok(());
    };

    let gateway = AuthorizationGateway::new(Arc::new(config.open_trail()?));
    match gateway.check_policy(&request, verb, resource, action) {
        Ok(permit) => {
            println!("ALLOW");
            print_hint(&format!("recorded as #{}", permit.audit_sequence()));
        }
        Err(AuthzError::Denied { reason }) => println!("DENY: {reason}"),
        Err(AuthzError::MalformedAction { action }) => {
            println!("DENY: unrecognized action: {action}");
        }
        Err(e @ AuthzError::Audit(_)) => return Err(e.into()),
    }
    Ok(())
}
