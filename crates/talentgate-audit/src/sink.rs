//! Storage backends behind the audit trail.
//!
//! A sink only ever appends. It must have durably accepted a record before
//! `append` returns `Ok`, because the gateway reports a decision to its
//! caller only after that point.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{error, warn};

use crate::record::AuditRecord;
use crate::{AuditError, Result};

/// Append-only storage for audit records.
pub trait AuditSink: Send + Sync + fmt::Debug {
    /// Durably appends one record.
    fn append(&self, record: &AuditRecord) -> Result<()>;

    /// Returns every stored record in write order.
    fn records(&self) -> Result<Vec<AuditRecord>>;
}

// ============================================================================
// Memory
// ============================================================================

/// In-process sink. Durable only for the life of the process.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemorySink {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| AuditError::LockPoisoned)?
            .push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<AuditRecord>> {
        Ok(self
            .records
            .lock()
            .map_err(|_| AuditError::LockPoisoned)?
            .clone())
    }
}

// ============================================================================
// JSON lines
// ============================================================================

/// File sink writing one JSON object per line.
///
/// The file is opened in append mode and synced after every record. A
/// write that fails is rolled back to the previous end of file, so the file
/// only ever holds whole lines.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Opens (or creates) the trail file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        discard_partial_tail(&file, &path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonLinesSink {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().map_err(|_| AuditError::LockPoisoned)?;
        let committed = file.metadata()?.len();

        let written = file
            .write_all(line.as_bytes())
            .and_then(|()| file.sync_data());
        if let Err(e) = written {
            if let Err(rollback) = file.set_len(committed).and_then(|()| file.sync_data()) {
                error!(
                    path = %self.path.display(),
                    committed,
                    error = %rollback,
                    "Failed to roll back partial audit write"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn records(&self) -> Result<Vec<AuditRecord>> {
        // Hold the writer lock so a concurrent append cannot be read half-written.
        let _guard = self.file.lock().map_err(|_| AuditError::LockPoisoned)?;

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record =
                serde_json::from_str(&line).map_err(|e| AuditError::Corrupted {
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Truncates a trailing line that has no newline.
///
/// Such a line is a record whose write never completed, so it was never
/// acknowledged to a caller.
fn discard_partial_tail(file: &File, path: &Path) -> Result<()> {
    let contents = fs::read(path)?;
    if contents.last().is_none_or(|byte| *byte == b'\n') {
        return Ok(());
    }

    let keep = contents
        .iter()
        .rposition(|byte| *byte == b'\n')
        .map_or(0, |index| index + 1);
    warn!(
        path = %path.display(),
        discarded_bytes = contents.len() - keep,
        "Discarding incomplete trailing audit record"
    );
    file.set_len(keep as u64)?;
    file.sync_data()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AuditEntry;
    use chrono::Utc;
    use talentgate_types::{AuditStatus, ResourceKey, SubjectContext};
    use tempfile::tempdir;

    fn record(sequence: u64) -> AuditRecord {
        AuditRecord::seal(
            AuditEntry::new(
                "signin",
                ResourceKey::new("user:a@example.com"),
                AuditStatus::Success,
                SubjectContext::least_privileged(),
            ),
            sequence,
            None,
            Utc::now(),
        )
        .expect("seal must succeed")
    }

    #[test]
    fn memory_sink_keeps_write_order() {
        let sink = MemorySink::new();
        sink.append(&record(0)).unwrap();
        sink.append(&record(1)).unwrap();

        let stored = sink.records().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].sequence(), 0);
        assert_eq!(stored[1].sequence(), 1);
    }

    #[test]
    fn json_lines_sink_persists_across_reopen() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("audit.jsonl");

        {
            let sink = JsonLinesSink::open(&path).unwrap();
            sink.append(&record(0)).unwrap();
            sink.append(&record(1)).unwrap();
        }

        let sink = JsonLinesSink::open(&path).unwrap();
        let stored = sink.records().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].sequence(), 1);

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn json_lines_sink_reports_corrupted_line() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("audit.jsonl");

        let sink = JsonLinesSink::open(&path).unwrap();
        sink.append(&record(0)).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{not json}\n")
            .unwrap();

        match sink.records() {
            Err(AuditError::Corrupted { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Corrupted, got {other:?}"),
        }
    }

    #[test]
    fn json_lines_sink_discards_incomplete_trailing_line() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("audit.jsonl");

        {
            let sink = JsonLinesSink::open(&path).unwrap();
            sink.append(&record(0)).unwrap();
            sink.append(&record(1)).unwrap();
        }
        let intact = fs::read(&path).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{\"sequence\":2,\"record_id\":\"")
            .unwrap();

        let sink = JsonLinesSink::open(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), intact);
        assert_eq!(sink.records().unwrap().len(), 2);

        sink.append(&record(2)).unwrap();
        let stored = sink.records().unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].sequence(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn json_lines_sink_drops_lone_partial_line() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("audit.jsonl");
        fs::write(&path, b"{\"sequence\":0,").unwrap();

        let sink = JsonLinesSink::open(&path).unwrap();
        assert!(sink.records().unwrap().is_empty());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
