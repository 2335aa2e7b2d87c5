//! End-to-end tests of guarded recruiting operations.
//!
//! Each operation below follows the shape the host application uses: a
//! coarse role gate, an optional fine-grained policy check, then the work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use talentgate_abac::{RequestState, SessionKey};
use talentgate_audit::{
    AuditError, AuditQuery, AuditRecord, AuditSink, AuditTrail, JsonLinesSink, MemorySink,
};
use talentgate_gateway::{AuthorizationGateway, AuthzError, Permit};
use talentgate_types::{AuditStatus, ResourceDescriptor, ResourceKey, Role};

const HIRING_ROLES: &[Role] = &[Role::Recruiter, Role::Admin];

fn recruiter(department: &str, clearance: &str) -> RequestState {
    RequestState::new()
        .with(SessionKey::UserId, "recruiter@company.com")
        .with(SessionKey::Role, "recruiter")
        .with(SessionKey::Department, department)
        .with(SessionKey::ClearanceLevel, clearance)
        .with_source_address("192.168.1.1")
}

fn candidate(id: &str) -> RequestState {
    RequestState::new()
        .with(SessionKey::UserId, id)
        .with(SessionKey::Role, "candidate")
        .with_source_address("203.0.113.45")
}

fn update_candidate_stage(
    gateway: &AuthorizationGateway,
    request: &RequestState,
    target: &ResourceDescriptor,
    stage: &str,
) -> Result<Permit, AuthzError> {
    gateway.require_permission(request, HIRING_ROLES, &target.key())?;
    gateway.check_policy_with_details(
        request,
        "update_candidate_stage",
        target,
        "write",
        &format!("Moved to {stage}"),
    )
}

fn create_job_posting(
    gateway: &AuthorizationGateway,
    request: &RequestState,
) -> Result<Permit, AuthzError> {
    gateway.require_permission(request, HIRING_ROLES, &ResourceKey::new("job_posting"))
}

fn submit_application(
    gateway: &AuthorizationGateway,
    request: &RequestState,
    job_id: &str,
) -> Result<Permit, AuthzError> {
    gateway.require_permission(
        request,
        &[Role::Candidate],
        &ResourceKey::typed("application", job_id),
    )
}

fn all_records(gateway: &AuthorizationGateway) -> Vec<AuditRecord> {
    gateway.trail().query(&AuditQuery::default()).unwrap()
}

#[test]
fn stage_update_within_department_is_allowed_and_audited() {
    let gateway = AuthorizationGateway::new(Arc::new(AuditTrail::in_memory()));
    let target = ResourceDescriptor::new("candidate", "sarah-001")
        .with_department("engineering")
        .with_sensitivity(2);

    let permit =
        update_candidate_stage(&gateway, &recruiter("engineering", "3"), &target, "interview")
            .unwrap();
    assert_eq!(permit.audit_sequence(), 1);

    let records = all_records(&gateway);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action(), "access_granted");
    assert_eq!(records[1].action(), "update_candidate_stage");
    assert_eq!(records[1].status(), AuditStatus::Success);
    assert_eq!(records[1].resource().as_str(), "candidate:sarah-001");
    assert_eq!(records[1].source_address(), "192.168.1.1");
    assert_eq!(records[1].details(), Some("Moved to interview"));
    assert_eq!(gateway.trail().verify_chain().unwrap(), 2);
}

#[test]
fn stage_update_without_clearance_margin_is_denied() {
    let gateway = AuthorizationGateway::new(Arc::new(AuditTrail::in_memory()));
    let target = ResourceDescriptor::new("candidate", "c-5").with_sensitivity(3);

    let err = update_candidate_stage(&gateway, &recruiter("engineering", "3"), &target, "offer")
        .unwrap_err();
    assert!(err.is_denied());
    assert_eq!(err.to_string(), "Insufficient permissions");

    let records = all_records(&gateway);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status(), AuditStatus::Denied);
    assert!(
        records[1]
            .details()
            .is_some_and(|d| d.starts_with("ABAC policy violation"))
    );
}

#[test]
fn candidate_cannot_reach_policy_check() {
    let gateway = AuthorizationGateway::new(Arc::new(AuditTrail::in_memory()));
    let target = ResourceDescriptor::new("candidate", "c-1").with_owner("c-1");

    let err = update_candidate_stage(&gateway, &candidate("c-1"), &target, "hired").unwrap_err();
    assert!(err.is_denied());

    // The role gate stops the flow; only one record is written.
    let records = all_records(&gateway);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action(), "access_denied");
    assert_eq!(records[0].details(), Some("Role candidate not in recruiter,admin"));
}

#[test]
fn job_posting_and_application_gates() {
    let gateway = AuthorizationGateway::new(Arc::new(AuditTrail::in_memory()));

    assert!(create_job_posting(&gateway, &recruiter("sales", "1")).is_ok());
    assert!(create_job_posting(&gateway, &candidate("c-2")).is_err());
    assert!(submit_application(&gateway, &candidate("c-2"), "job-9").is_ok());
    assert!(submit_application(&gateway, &recruiter("sales", "1"), "job-9").is_err());

    let denied = gateway
        .trail()
        .query(&AuditQuery::default().with_status(AuditStatus::Denied))
        .unwrap();
    assert_eq!(denied.len(), 2);
    assert_eq!(gateway.trail().count().unwrap(), 4);
}

#[test]
fn missing_session_degrades_to_least_privilege() {
    let gateway = AuthorizationGateway::new(Arc::new(AuditTrail::in_memory()));
    let target = ResourceDescriptor::new("candidate", "c-1");

    let err = gateway
        .check_policy(&RequestState::new(), "view_resume", &target, "read")
        .unwrap_err();
    assert!(err.is_denied());

    let record = &all_records(&gateway)[0];
    assert_eq!(record.actor(), "anonymous");
    assert_eq!(record.source_address(), "0.0.0.0");
    assert_eq!(record.context().role(), Role::Candidate);
}

/// Sink that accepts nothing.
#[derive(Debug)]
struct DownSink;

impl AuditSink for DownSink {
    fn append(&self, _record: &AuditRecord) -> talentgate_audit::Result<()> {
        Err(AuditError::Sink("connection refused".into()))
    }

    fn records(&self) -> talentgate_audit::Result<Vec<AuditRecord>> {
        Ok(Vec::new())
    }
}

#[test]
fn audit_failure_rejects_an_allowed_request() {
    let trail = Arc::new(AuditTrail::open(Arc::new(DownSink)).unwrap());
    let gateway = AuthorizationGateway::new(Arc::clone(&trail));

    let result = create_job_posting(&gateway, &recruiter("engineering", "5"));
    match result {
        Err(AuthzError::Audit(AuditError::Sink(_))) => {}
        other => panic!("expected audit failure, got {other:?}"),
    }
    assert_eq!(trail.count().unwrap(), 0);
}

/// Sink that keeps its first record but reports the write as failed.
#[derive(Debug, Default)]
struct LostAckSink {
    inner: MemorySink,
    failed_once: AtomicBool,
}

impl AuditSink for LostAckSink {
    fn append(&self, record: &AuditRecord) -> talentgate_audit::Result<()> {
        self.inner.append(record)?;
        if self.failed_once.swap(true, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuditError::Sink("fsync failed".into()))
        }
    }

    fn records(&self) -> talentgate_audit::Result<Vec<AuditRecord>> {
        self.inner.records()
    }
}

#[test]
fn lost_write_acknowledgement_keeps_trail_consistent() {
    let sink = Arc::new(LostAckSink::default());
    let trail = Arc::new(AuditTrail::open(sink.clone()).unwrap());
    let gateway = AuthorizationGateway::new(Arc::clone(&trail));

    let result = create_job_posting(&gateway, &recruiter("engineering", "5"));
    assert!(matches!(result, Err(AuthzError::Audit(AuditError::Sink(_)))));

    // The kept grant is followed by the rejection, on the next sequence.
    let records = all_records(&gateway);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sequence(), 0);
    assert_eq!(records[1].sequence(), 1);
    assert_eq!(records[1].action(), "access_granted");
    assert_eq!(records[1].status(), AuditStatus::Error);
    assert_eq!(
        records[1].details(),
        Some("Audit write failed; request rejected")
    );
    assert_eq!(trail.count().unwrap(), 2);
    assert_eq!(trail.verify_chain().unwrap(), 2);

    // Later requests continue the same chain.
    let permit = create_job_posting(&gateway, &recruiter("engineering", "5")).unwrap();
    assert_eq!(permit.audit_sequence(), 2);
    assert_eq!(trail.verify_chain().unwrap(), 3);
}

#[test]
fn concurrent_requests_keep_a_gap_free_trail() {
    let gateway = AuthorizationGateway::new(Arc::new(AuditTrail::open(Arc::new(MemorySink::new())).unwrap()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let gateway = gateway.clone();
            thread::spawn(move || {
                let request = if i % 2 == 0 {
                    recruiter("engineering", "3")
                } else {
                    candidate(&format!("c-{i}"))
                };
                for _ in 0..10 {
                    let _ = create_job_posting(&gateway, &request);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let records = all_records(&gateway);
    assert_eq!(records.len(), 80);
    for (index, record) in records.iter().enumerate() {
        assert_eq!(record.sequence(), index as u64);
    }
    assert_eq!(gateway.trail().verify_chain().unwrap(), 80);
}

#[test]
fn file_backed_trail_survives_restart() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("audit.jsonl");

    {
        let trail = AuditTrail::open(Arc::new(JsonLinesSink::open(&path).unwrap())).unwrap();
        let gateway = AuthorizationGateway::new(Arc::new(trail));
        create_job_posting(&gateway, &recruiter("engineering", "2")).unwrap();
    }

    let trail = AuditTrail::open(Arc::new(JsonLinesSink::open(&path).unwrap())).unwrap();
    let gateway = AuthorizationGateway::new(Arc::new(trail));
    let _ = create_job_posting(&gateway, &candidate("c-3"));

    let records = all_records(&gateway);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].sequence(), 1);
    assert_eq!(records[1].status(), AuditStatus::Denied);
    assert_eq!(gateway.trail().verify_chain().unwrap(), 2);
}
