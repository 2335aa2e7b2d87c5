//! Audit trail review commands.

use anyhow::{Context, Result};
use talentgate_audit::{AuditQuery, AuditTrail};
use talentgate_config::{SinkKind, TalentgateConfig};
use tracing::debug;

use crate::style::{print_audit_table, print_error, print_success, print_warn};

pub fn query(config: &TalentgateConfig, filter: &AuditQuery, json: bool) -> Result<()> {
    if config.audit.sink == SinkKind::Memory {
        print_warn("memory sink configured; there is no persisted trail to read");
    }

    let trail = open(config)?;

    if json {
        println!("{}", trail.export_json(filter)?);
        return Ok(());
    }

    let records = trail.query(filter)?;
    print_audit_table(&records);
    Ok(())
}

pub fn verify(config: &TalentgateConfig) -> Result<()> {
    let trail = open(config)?;

    match trail.verify_chain() {
        Ok(count) => {
            print_success(&format!("audit chain intact ({count} records)"));
            Ok(())
        }
        Err(e) => {
            print_error(&e.to_string());
            anyhow::bail!("audit trail failed verification")
        }
    }
}

fn open(config: &TalentgateConfig) -> Result<AuditTrail> {
    debug!(
        sink = ?config.audit.sink,
        path = %config.audit.path.display(),
        "Opening audit trail"
    );
    config.open_trail().context("Failed to open audit trail")
}
