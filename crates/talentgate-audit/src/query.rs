//! Read-side filtering for operator review.

use chrono::{DateTime, Utc};
use talentgate_types::AuditStatus;

use crate::record::AuditRecord;

/// Query filter for the audit trail.
///
/// All fields are optional. When multiple fields are set, they are combined
/// with AND logic. Use builder methods for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AuditQuery {
    /// Substring matched against actor, action, resource and source address.
    pub search: Option<String>,
    pub status: Option<AuditStatus>,
    pub actor: Option<String>,
    pub action: Option<String>,
    /// Resource type, the part of the resource key before `:`.
    pub resource_kind: Option<String>,
    pub time_from: Option<DateTime<Utc>>,
    pub time_to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Free-text search across actor, action, resource and source address.
    pub fn with_search(mut self, term: &str) -> Self {
        self.search = Some(term.to_string());
        self
    }

    pub fn with_status(mut self, status: AuditStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    pub fn with_action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn with_resource_kind(mut self, kind: &str) -> Self {
        self.resource_kind = Some(kind.to_string());
        self
    }

    /// Filter to records within a time range (inclusive).
    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.time_from = Some(from);
        self.time_to = Some(to);
        self
    }

    /// Limit the number of results returned.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether a single record matches all active filter criteria.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(ref term) = self.search {
            let hit = record.actor().contains(term.as_str())
                || record.action().contains(term.as_str())
                || record.resource().as_str().contains(term.as_str())
                || record.source_address().contains(term.as_str());
            if !hit {
                return false;
            }
        }

        if let Some(status) = self.status {
            if record.status() != status {
                return false;
            }
        }

        if let Some(ref actor) = self.actor {
            if record.actor() != actor {
                return false;
            }
        }

        if let Some(ref action) = self.action {
            if record.action() != action {
                return false;
            }
        }

        if let Some(ref kind) = self.resource_kind {
            if record.resource().kind() != kind {
                return false;
            }
        }

        if let Some(from) = self.time_from {
            if record.timestamp() < from {
                return false;
            }
        }
        if let Some(to) = self.time_to {
            if record.timestamp() > to {
                return false;
            }
        }

        true
    }

    /// Applies the filter and limit to records already in sequence order.
    pub(crate) fn apply(&self, records: Vec<AuditRecord>) -> Vec<AuditRecord> {
        let matching = records.into_iter().filter(|record| self.matches(record));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}
