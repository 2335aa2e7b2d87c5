//! Audit record types and the hash chain that links them.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use talentgate_types::{AuditStatus, ResourceKey, SubjectContext, UNKNOWN_SOURCE_ADDRESS};
use uuid::Uuid;

use crate::Result;

// ============================================================================
// Chain hash
// ============================================================================

/// SHA-256 link between consecutive records. Serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHash([u8; 32]);

impl ChainHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `SHA-256(prev || data)`, or `SHA-256(data)` for the genesis record.
    pub fn chain(prev: Option<&ChainHash>, data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        if let Some(prev) = prev {
            hasher.update(prev.0);
        }
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({})", &self.to_hex()[..16])
    }
}

impl Serialize for ChainHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChainHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ChainHash::from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid chain hash: {hex}")))
    }
}

// ============================================================================
// Entry (append input)
// ============================================================================

/// What a caller asks the trail to record.
///
/// The trail turns an entry into an [`AuditRecord`] by assigning its
/// sequence, identifier, timestamp and chain hash.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: String,
    pub resource: ResourceKey,
    pub status: AuditStatus,
    pub details: Option<String>,
    pub context: SubjectContext,
    pub source_address: String,
}

impl AuditEntry {
    pub fn new(
        action: impl Into<String>,
        resource: ResourceKey,
        status: AuditStatus,
        context: SubjectContext,
    ) -> Self {
        Self {
            action: action.into(),
            resource,
            status,
            details: None,
            context,
            source_address: UNKNOWN_SOURCE_ADDRESS.to_string(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source_address(mut self, address: impl Into<String>) -> Self {
        self.source_address = address.into();
        self
    }
}

// ============================================================================
// Record
// ============================================================================

/// An immutable audit fact.
///
/// All fields are set when the trail seals the record and are exposed
/// through accessors only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    sequence: u64,
    record_id: Uuid,
    timestamp: DateTime<Utc>,
    actor: String,
    action: String,
    resource: ResourceKey,
    status: AuditStatus,
    source_address: String,
    details: Option<String>,
    context: SubjectContext,
    prev_hash: Option<ChainHash>,
    hash: ChainHash,
}

/// Fields covered by the chain hash, in a fixed order.
#[derive(Serialize)]
struct Canonical<'a> {
    sequence: u64,
    record_id: &'a Uuid,
    timestamp: &'a DateTime<Utc>,
    actor: &'a str,
    action: &'a str,
    resource: &'a ResourceKey,
    status: AuditStatus,
    source_address: &'a str,
    details: Option<&'a str>,
    context: &'a SubjectContext,
}

impl AuditRecord {
    /// Seals an entry into a record linked to `prev_hash`.
    pub(crate) fn seal(
        entry: AuditEntry,
        sequence: u64,
        prev_hash: Option<ChainHash>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let mut record = Self {
            sequence,
            record_id: Uuid::new_v4(),
            timestamp,
            actor: entry.context.actor().to_string(),
            action: entry.action,
            resource: entry.resource,
            status: entry.status,
            source_address: entry.source_address,
            details: entry.details,
            context: entry.context,
            prev_hash,
            // Placeholder until the canonical form is hashed below.
            hash: ChainHash([0u8; 32]),
        };
        record.hash = record.compute_hash()?;
        Ok(record)
    }

    /// Recomputes this record's chain hash from its contents.
    pub fn compute_hash(&self) -> Result<ChainHash> {
        let canonical = Canonical {
            sequence: self.sequence,
            record_id: &self.record_id,
            timestamp: &self.timestamp,
            actor: &self.actor,
            action: &self.action,
            resource: &self.resource,
            status: self.status,
            source_address: &self.source_address,
            details: self.details.as_deref(),
            context: &self.context,
        };
        let bytes = postcard::to_allocvec(&canonical)?;
        Ok(ChainHash::chain(self.prev_hash.as_ref(), &bytes))
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn resource(&self) -> &ResourceKey {
        &self.resource
    }

    pub fn status(&self) -> AuditStatus {
        self.status
    }

    pub fn source_address(&self) -> &str {
        &self.source_address
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// The full subject context at decision time.
    pub fn context(&self) -> &SubjectContext {
        &self.context
    }

    pub fn prev_hash(&self) -> Option<&ChainHash> {
        self.prev_hash.as_ref()
    }

    pub fn hash(&self) -> &ChainHash {
        &self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: &str) -> AuditEntry {
        AuditEntry::new(
            action,
            ResourceKey::new("candidate:c-1"),
            AuditStatus::Success,
            SubjectContext::least_privileged(),
        )
    }

    #[test]
    fn chain_hash_hex_round_trip() {
        let hash = ChainHash::chain(None, b"genesis");
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(ChainHash::from_hex(&hex), Some(hash));
        assert_eq!(ChainHash::from_hex("zz"), None);
        assert_eq!(ChainHash::from_hex(&"g".repeat(64)), None);
    }

    #[test]
    fn chained_hash_depends_on_prev() {
        let genesis = ChainHash::chain(None, b"a");
        let linked = ChainHash::chain(Some(&genesis), b"b");
        assert_ne!(linked, ChainHash::chain(None, b"b"));
    }

    #[test]
    fn sealed_record_hash_verifies() {
        let record = AuditRecord::seal(entry("signin"), 0, None, Utc::now()).unwrap();
        assert_eq!(record.compute_hash().unwrap(), *record.hash());
        assert_eq!(record.actor(), "anonymous");
        assert_eq!(record.source_address(), "0.0.0.0");
    }

    #[test]
    fn json_round_trip_preserves_hash() {
        let record = AuditRecord::seal(
            entry("update_candidate_stage").with_details("Moved to interview"),
            4,
            Some(ChainHash::chain(None, b"prev")),
            Utc::now(),
        )
        .unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let back: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.compute_hash().unwrap(), *record.hash());
    }
}
