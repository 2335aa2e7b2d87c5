//! Audit events emitted by the sign-in and sign-up flows.
//!
//! Credential checks happen elsewhere; these helpers only record what
//! happened. The device signal is advisory and never blocks a sign-in.

use talentgate_abac::RequestState;
use talentgate_device::{DeviceAttributes, DeviceFingerprint, is_new_device};
use talentgate_types::{AuditStatus, ResourceKey, Role};
use tracing::info;

use crate::error::Result;
use crate::gateway::AuthorizationGateway;

pub const SIGNIN: &str = "signin";
pub const SIGNUP: &str = "signup";
pub const LOGIN_NEW_DEVICE: &str = "login_new_device";

/// What the sign-in flow learned about the client device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    /// Token to store for the user's next sign-in.
    pub fingerprint: DeviceFingerprint,
    pub new_device: bool,
}

fn user_resource(email: &str) -> ResourceKey {
    ResourceKey::typed("user", email)
}

/// Records a successful sign-in, preceded by `login_new_device` when the
/// device does not match the stored fingerprint.
pub fn record_sign_in(
    gateway: &AuthorizationGateway,
    request: &RequestState,
    email: &str,
    device: &DeviceAttributes,
    stored: Option<&DeviceFingerprint>,
) -> Result<SignInOutcome> {
    let fingerprint = device.fingerprint();
    let new_device = is_new_device(stored, &fingerprint);

    if new_device {
        info!(email, fingerprint = %fingerprint, "Sign-in from new device");
        gateway.audit_action(
            request,
            LOGIN_NEW_DEVICE,
            user_resource(email),
            AuditStatus::Success,
            Some(&format!("New device fingerprint: {fingerprint}")),
        )?;
    }

    gateway.audit_action(
        request,
        SIGNIN,
        user_resource(email),
        AuditStatus::Success,
        Some("User authenticated"),
    )?;

    Ok(SignInOutcome {
        fingerprint,
        new_device,
    })
}

/// Records a completed registration.
pub fn record_sign_up(
    gateway: &AuthorizationGateway,
    request: &RequestState,
    email: &str,
    role: Role,
) -> Result<()> {
    gateway.audit_action(
        request,
        SIGNUP,
        user_resource(email),
        AuditStatus::Success,
        Some(&format!("Registered as {role}")),
    )?;
    Ok(())
}

/// Records a failed sign-in or sign-up with the provider's message.
pub fn record_auth_failure(
    gateway: &AuthorizationGateway,
    request: &RequestState,
    verb: &str,
    email: &str,
    message: &str,
) -> Result<()> {
    gateway.audit_action(
        request,
        verb,
        user_resource(email),
        AuditStatus::Error,
        Some(message),
    )?;
    Ok(())
}
