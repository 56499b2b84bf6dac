//! Exported log snapshots.
//!
//! `AuditSnapshot` is what the persistence layer stores and later hands back
//! to `InMemoryAuditLog::restore`. Entries and checkpoints are carried
//! exactly as stored; nothing is recomputed on export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attest_contracts::{
    entry::{AuditEntry, MerkleCheckpoint, GENESIS_HASH},
    error::{AttestError, AttestResult},
};

/// The full entry and checkpoint sequences of one audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSnapshot {
    /// All entries in append order.
    pub entries: Vec<AuditEntry>,

    /// All checkpoints in creation order.
    pub checkpoints: Vec<MerkleCheckpoint>,

    /// `payload_hash` of the last entry, or `GENESIS_HASH` when empty. The
    /// next append would link here.
    pub head_hash: String,

    /// Wall-clock time (UTC) the snapshot was taken.
    pub exported_at: DateTime<Utc>,
}

impl AuditSnapshot {
    pub fn new(
        entries: Vec<AuditEntry>,
        checkpoints: Vec<MerkleCheckpoint>,
        exported_at: DateTime<Utc>,
    ) -> Self {
        let head_hash = entries
            .last()
            .map(|e| e.payload_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        Self {
            entries,
            checkpoints,
            head_hash,
            exported_at,
        }
    }

    pub fn to_json(&self) -> AttestResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AttestError::SnapshotError {
            reason: format!("failed to serialize snapshot: {}", e),
        })
    }

    pub fn from_json(s: &str) -> AttestResult<Self> {
        serde_json::from_str(s).map_err(|e| AttestError::SnapshotError {
            reason: format!("failed to parse snapshot JSON: {}", e),
        })
    }
}
