//! # talentgate-types: Core types for `Talentgate`
//!
//! This crate contains the shared data model of the access-control core:
//! - Subject attributes ([`UserId`], [`Role`], [`Department`], [`ClearanceLevel`])
//! - Resource attributes ([`ResourceDescriptor`], [`ResourceKey`], [`Sensitivity`])
//! - Protected actions ([`Action`])
//! - Decisions ([`Decision`], [`DenyReason`])
//! - Audit outcome tags ([`AuditStatus`])
//!
//! Everything here is plain data. Evaluation lives in `talentgate-abac`,
//! persistence in `talentgate-audit`.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Subject identity
// ============================================================================

/// Opaque, stable identifier of a subject (user or service account).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Role
// ============================================================================

/// Error returned when a role string is not one of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// Role of the acting subject. Selects which policy branch applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Applicant; may only read resources they own.
    Candidate,
    /// Department-scoped reader and writer of candidate data.
    Recruiter,
    /// Only role allowed to delete, and only at maximum clearance.
    Admin,
    /// Participates in interviews; holds no data permissions in the core policy.
    Interviewer,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Candidate,
        Role::Recruiter,
        Role::Admin,
        Role::Interviewer,
    ];

    /// Parses a role name, returning `None` for anything outside the closed set.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "candidate" => Some(Role::Candidate),
            "recruiter" => Some(Role::Recruiter),
            "admin" => Some(Role::Admin),
            "interviewer" => Some(Role::Interviewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Recruiter => "recruiter",
            Role::Admin => "admin",
            Role::Interviewer => "interviewer",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Renders a role list as `a,b,c` for audit details.
pub fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Action
// ============================================================================

/// Error returned when an action string is not a known action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

/// A protected operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "write" => Ok(Action::Write),
            "delete" => Ok(Action::Delete),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

// ============================================================================
// Department
// ============================================================================

/// Organizational department of a subject or resource.
///
/// `Unassigned` is the catch-all for missing values. It never matches any
/// department, including another `Unassigned`. `PartialEq` is structural;
/// policy code must use [`Department::matches`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Department {
    Assigned(String),
    #[default]
    Unassigned,
}

impl Department {
    /// Creates a department; blank names become `Unassigned`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            Department::Unassigned
        } else {
            Department::Assigned(name)
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Department::Assigned(name) => Some(name),
            Department::Unassigned => None,
        }
    }

    /// Returns true only when both sides are assigned and equal.
    pub fn matches(&self, other: &Department) -> bool {
        match (self, other) {
            (Department::Assigned(a), Department::Assigned(b)) => a == b,
            _ => false,
        }
    }
}

impl Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Department::Assigned(name) => f.write_str(name),
            Department::Unassigned => f.write_str("(unassigned)"),
        }
    }
}

impl From<Option<String>> for Department {
    fn from(value: Option<String>) -> Self {
        value.map_or(Department::Unassigned, Department::new)
    }
}

impl From<Department> for Option<String> {
    fn from(value: Department) -> Self {
        match value {
            Department::Assigned(name) => Some(name),
            Department::Unassigned => None,
        }
    }
}

impl From<&str> for Department {
    fn from(value: &str) -> Self {
        Department::new(value)
    }
}

// ============================================================================
// Clearance / Sensitivity
// ============================================================================

/// Integer privilege rank of a subject. Higher is more privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ClearanceLevel(u32);

impl ClearanceLevel {
    /// Clearance assumed when the session does not carry one.
    pub const DEFAULT: ClearanceLevel = ClearanceLevel(1);

    /// Fixed maximum-clearance threshold required for deletes.
    pub const MAX_THRESHOLD: ClearanceLevel = ClearanceLevel(5);

    pub fn new(level: u32) -> Self {
        Self(level)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Read eligibility: clearance at least the resource sensitivity.
    pub fn covers(self, sensitivity: Sensitivity) -> bool {
        self.0 >= sensitivity.get()
    }

    /// Write eligibility: clearance strictly above the resource sensitivity.
    pub fn exceeds(self, sensitivity: Sensitivity) -> bool {
        self.0 > sensitivity.get()
    }
}

impl Display for ClearanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClearanceLevel {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Integer confidentiality rank of a resource, fixed at creation time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Sensitivity(u32);

impl Sensitivity {
    pub fn new(level: u32) -> Self {
        Self(level)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Sensitivity {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

// ============================================================================
// Subject context
// ============================================================================

/// Attributes of the acting principal for a single request.
///
/// Built once per request from trusted session state and never mutated
/// afterwards; there are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectContext {
    user_id: Option<UserId>,
    role: Role,
    department: Department,
    clearance: ClearanceLevel,
}

impl SubjectContext {
    pub fn new(
        user_id: Option<UserId>,
        role: Role,
        department: Department,
        clearance: ClearanceLevel,
    ) -> Self {
        Self {
            user_id,
            role,
            department,
            clearance,
        }
    }

    /// The least-privileged context: anonymous candidate, unassigned, clearance 1.
    pub fn least_privileged() -> Self {
        Self::new(
            None,
            Role::Candidate,
            Department::Unassigned,
            ClearanceLevel::DEFAULT,
        )
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn department(&self) -> &Department {
        &self.department
    }

    pub fn clearance(&self) -> ClearanceLevel {
        self.clearance
    }

    /// Name recorded as the audit actor.
    pub fn actor(&self) -> &str {
        self.user_id.as_ref().map_or("anonymous", UserId::as_str)
    }
}

/// Source address recorded when the transport layer could not determine one.
pub const UNKNOWN_SOURCE_ADDRESS: &str = "0.0.0.0";

// ============================================================================
// Resources
// ============================================================================

/// The `type:id` string identifying a resource in audit records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key used when a coarse check names no resource.
    pub fn unknown() -> Self {
        Self::new("unknown")
    }

    pub fn typed(kind: &str, id: &str) -> Self {
        Self(format!("{kind}:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The portion before the first `:`, or the whole key when untyped.
    pub fn kind(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(kind, _)| kind)
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Attributes of the object an action targets, supplied by the owning component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub id: String,
    pub kind: String,
    pub owner: Option<UserId>,
    pub department: Department,
    pub sensitivity: Sensitivity,
}

impl ResourceDescriptor {
    /// Creates a descriptor with no owner, no department, and sensitivity 0.
    pub fn new(kind: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            owner: None,
            department: Department::Unassigned,
            sensitivity: Sensitivity::default(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<UserId>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<Department>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: u32) -> Self {
        self.sensitivity = Sensitivity::new(sensitivity);
        self
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::typed(&self.kind, &self.id)
    }
}

// ============================================================================
// Decisions
// ============================================================================

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// Subject and resource departments differ or are unassigned.
    DepartmentMismatch,
    /// Subject clearance is below what the action requires.
    InsufficientClearance {
        clearance: ClearanceLevel,
        required: u32,
    },
    /// Writes need clearance strictly above sensitivity.
    ClearanceMarginRequired {
        clearance: ClearanceLevel,
        sensitivity: Sensitivity,
    },
    /// Candidate reads are restricted to owned resources.
    NotOwner,
    /// No policy branch grants this action to the role.
    RoleNotPermitted { role: Role, action: Action },
    /// Coarse gate: role is outside the allowed set.
    RoleNotInSet { role: Role, allowed: Vec<Role> },
    /// The action string is not a known action.
    UnrecognizedAction(String),
}

impl Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::DepartmentMismatch => f.write_str("department mismatch"),
            DenyReason::InsufficientClearance {
                clearance,
                required,
            } => write!(f, "clearance {clearance} below required {required}"),
            DenyReason::ClearanceMarginRequired {
                clearance,
                sensitivity,
            } => write!(
                f,
                "clearance {clearance} must exceed sensitivity {sensitivity}"
            ),
            DenyReason::NotOwner => f.write_str("subject does not own resource"),
            DenyReason::RoleNotPermitted { role, action } => {
                write!(f, "role {role} may not {action}")
            }
            DenyReason::RoleNotInSet { role, allowed } => {
                write!(f, "Role {role} not in {}", join_roles(allowed))
            }
            DenyReason::UnrecognizedAction(action) => write!(f, "unrecognized action: {action}"),
        }
    }
}

/// Outcome of one evaluation. Never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }

    /// Allows when `condition` holds, otherwise denies with `reason`.
    pub fn allow_if(condition: bool, reason: impl FnOnce() -> DenyReason) -> Self {
        if condition {
            Decision::Allow
        } else {
            Decision::Deny(reason())
        }
    }
}

// ============================================================================
// Audit status
// ============================================================================

/// Outcome tag recorded on every audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Denied,
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Denied => "denied",
            AuditStatus::Error => "error",
        }
    }
}

impl Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AuditStatus::Success),
            "denied" => Ok(AuditStatus::Denied),
            "error" => Ok(AuditStatus::Error),
            other => Err(format!("unknown audit status: {other}")),
        }
    }
}

impl From<&Decision> for AuditStatus {
    fn from(decision: &Decision) -> Self {
        if decision.is_allowed() {
            AuditStatus::Success
        } else {
            AuditStatus::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("candidate", Some(Role::Candidate))]
    #[test_case("recruiter", Some(Role::Recruiter))]
    #[test_case("admin", Some(Role::Admin))]
    #[test_case("interviewer", Some(Role::Interviewer))]
    #[test_case("Admin", None; "role names are case sensitive")]
    #[test_case("superuser", None)]
    #[test_case("", None; "empty")]
    fn role_parse(input: &str, expected: Option<Role>) {
        assert_eq!(Role::parse(input), expected);
    }

    #[test]
    fn role_round_trips_through_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn unknown_action_is_an_error() {
        assert_eq!("read".parse::<Action>(), Ok(Action::Read));
        assert_eq!(
            "approve".parse::<Action>(),
            Err(UnknownAction("approve".into()))
        );
    }

    #[test]
    fn unassigned_department_never_matches() {
        let eng = Department::new("eng");
        assert!(eng.matches(&Department::new("eng")));
        assert!(!eng.matches(&Department::new("sales")));
        assert!(!Department::Unassigned.matches(&Department::Unassigned));
        assert!(!Department::Unassigned.matches(&eng));
        assert!(!eng.matches(&Department::Unassigned));
    }

    #[test]
    fn blank_department_is_unassigned() {
        assert_eq!(Department::new("   "), Department::Unassigned);
        assert_eq!(Department::from(None), Department::Unassigned);
    }

    #[test]
    fn department_serializes_as_optional_string() {
        let json = serde_json::to_string(&Department::new("eng")).unwrap();
        assert_eq!(json, "\"eng\"");
        let json = serde_json::to_string(&Department::Unassigned).unwrap();
        assert_eq!(json, "null");
        let back: Department = serde_json::from_str("null").unwrap();
        assert_eq!(back, Department::Unassigned);
    }

    #[test]
    fn clearance_comparisons() {
        let three = ClearanceLevel::new(3);
        assert!(three.covers(Sensitivity::new(3)));
        assert!(!three.exceeds(Sensitivity::new(3)));
        assert!(three.exceeds(Sensitivity::new(2)));
        assert!(!ClearanceLevel::new(0).covers(Sensitivity::new(1)));
    }

    #[test]
    fn resource_key_kind() {
        let resource = ResourceDescriptor::new("candidate", "c-1");
        assert_eq!(resource.key().as_str(), "candidate:c-1");
        assert_eq!(resource.key().kind(), "candidate");
        assert_eq!(ResourceKey::new("job_posting").kind(), "job_posting");
    }

    #[test]
    fn anonymous_actor() {
        assert_eq!(SubjectContext::least_privileged().actor(), "anonymous");
        let ctx = SubjectContext::new(
            Some(UserId::new("u1")),
            Role::Recruiter,
            Department::new("eng"),
            ClearanceLevel::new(3),
        );
        assert_eq!(ctx.actor(), "u1");
    }

    #[test]
    fn role_not_in_set_reason_text() {
        let reason = DenyReason::RoleNotInSet {
            role: Role::Candidate,
            allowed: vec![Role::Recruiter, Role::Admin],
        };
        assert_eq!(reason.to_string(), "Role candidate not in recruiter,admin");
    }

    #[test]
    fn audit_status_from_decision() {
        assert_eq!(AuditStatus::from(&Decision::Allow), AuditStatus::Success);
        assert_eq!(
            AuditStatus::from(&Decision::Deny(DenyReason::NotOwner)),
            AuditStatus::Denied
        );
    }
}
