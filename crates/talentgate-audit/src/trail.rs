//! The append-only audit trail.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::query::AuditQuery;
use crate::record::{AuditEntry, AuditRecord, ChainHash};
use crate::sink::{AuditSink, MemorySink};
use crate::{AuditError, Result};

/// Position of the next record in the chain.
#[derive(Debug, Default, PartialEq, Eq)]
struct ChainHead {
    next_sequence: u64,
    last_hash: Option<ChainHash>,
}

impl ChainHead {
    /// The head that follows `last`, or genesis for an empty trail.
    fn after(last: Option<&AuditRecord>) -> Self {
        match last {
            Some(record) => Self {
                next_sequence: record.sequence() + 1,
                last_hash: Some(*record.hash()),
            },
            None => Self::default(),
        }
    }
}

/// Immutable, append-only audit trail.
///
/// Appends are serialized through the chain head, so the stored order is
/// the order in which writes completed, and every writer's records appear
/// in the order it issued them. The head advances after the sink accepts a
/// record. When a write fails, the head is re-read from what the sink
/// actually holds, so the next record always links to the stored chain.
#[derive(Debug)]
pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
    head: Mutex<ChainHead>,
}

impl AuditTrail {
    /// Opens a trail over `sink`, continuing the chain from its last record.
    pub fn open(sink: Arc<dyn AuditSink>) -> Result<Self> {
        let existing = sink.records()?;
        let head = ChainHead::after(existing.last());
        debug!(
            records = existing.len(),
            next_sequence = head.next_sequence,
            "Audit trail opened"
        );
        Ok(Self {
            sink,
            head: Mutex::new(head),
        })
    }

    /// A trail backed by a fresh [`MemorySink`].
    pub fn in_memory() -> Self {
        Self {
            sink: Arc::new(MemorySink::new()),
            head: Mutex::new(ChainHead::default()),
        }
    }

    /// Appends one entry and returns the sealed record.
    ///
    /// # Assertions
    ///
    /// - Post: on `Ok`, the record count increases by exactly 1
    /// - Post: on `Err`, the head matches the last record the sink holds
    pub fn append(&self, entry: AuditEntry) -> Result<AuditRecord> {
        let mut head = self.head.lock().map_err(|_| AuditError::LockPoisoned)?;

        let record = AuditRecord::seal(entry, head.next_sequence, head.last_hash, Utc::now())?;

        if let Err(e) = self.sink.append(&record) {
            error!(
                sequence = record.sequence(),
                action = record.action(),
                error = %e,
                "Audit append failed"
            );
            self.resync(&mut head);
            return Err(e);
        }

        head.next_sequence += 1;
        head.last_hash = Some(*record.hash());

        debug!(
            sequence = record.sequence(),
            actor = record.actor(),
            action = record.action(),
            status = %record.status(),
            "Audit record appended"
        );

        Ok(record)
    }

    /// Re-reads the head from the sink after a failed write.
    ///
    /// A sink may keep a record and still report failure. Continuing from
    /// the stale head would then reuse its sequence number.
    fn resync(&self, head: &mut ChainHead) {
        match self.sink.records() {
            Ok(stored) => {
                let recovered = ChainHead::after(stored.last());
                if recovered != *head {
                    warn!(
                        expected_sequence = head.next_sequence,
                        stored_sequence = recovered.next_sequence,
                        "Sink kept a record it reported as failed; continuing from stored chain"
                    );
                    *head = recovered;
                }
            }
            Err(e) => error!(error = %e, "Failed to re-read audit sink after write failure"),
        }
    }

    /// Total number of records in the trail.
    pub fn count(&self) -> Result<u64> {
        Ok(self
            .head
            .lock()
            .map_err(|_| AuditError::LockPoisoned)?
            .next_sequence)
    }

    /// Records matching the filter, in sequence order.
    pub fn query(&self, filter: &AuditQuery) -> Result<Vec<AuditRecord>> {
        Ok(filter.apply(self.sink.records()?))
    }

    /// Looks up a single record by its sequence number.
    pub fn get(&self, sequence: u64) -> Result<Option<AuditRecord>> {
        Ok(self
            .sink
            .records()?
            .into_iter()
            .find(|r| r.sequence() == sequence))
    }

    /// Export filtered records as a pretty JSON array.
    pub fn export_json(&self, filter: &AuditQuery) -> Result<String> {
        let records = self.query(filter)?;
        serde_json::to_string_pretty(&records).map_err(AuditError::from)
    }

    /// Verifies sequence continuity and the hash chain from genesis.
    ///
    /// Returns the number of verified records.
    pub fn verify_chain(&self) -> Result<usize> {
        verify_records(&self.sink.records()?)
    }
}

/// Verifies that `records` form one unbroken chain starting at genesis.
pub fn verify_records(records: &[AuditRecord]) -> Result<usize> {
    let mut expected_prev: Option<ChainHash> = None;

    for (index, record) in records.iter().enumerate() {
        let expected_sequence = index as u64;
        if record.sequence() != expected_sequence {
            return Err(AuditError::ChainBroken {
                sequence: record.sequence(),
                reason: format!("expected sequence {expected_sequence}"),
            });
        }

        if record.prev_hash() != expected_prev.as_ref() {
            return Err(AuditError::ChainBroken {
                sequence: record.sequence(),
                reason: "previous hash does not link".to_string(),
            });
        }

        if record.compute_hash()? != *record.hash() {
            return Err(AuditError::ChainBroken {
                sequence: record.sequence(),
                reason: "record contents do not match hash".to_string(),
            });
        }

        expected_prev = Some(*record.hash());
    }

    Ok(records.len())
}
