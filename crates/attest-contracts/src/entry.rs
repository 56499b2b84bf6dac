//! Audit entry and Merkle checkpoint types.
//!
//! `AuditEntry` is one link in the hash chain. `MerkleCheckpoint` anchors a
//! completed batch of entries under a single root. Both are immutable once
//! the store has accepted them.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::decision::Effect;

/// The `prev_hash` of the first entry in a chain, and the Merkle root of an
/// empty batch.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// True if `s` has the shape of a rendered digest: 64 lowercase hex chars.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

static ENTRY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque identifier of an audit entry.
///
/// Derived from a hash of the wall-clock time, a random UUID, and a
/// process-wide counter. The counter keeps ids unique within a process even
/// if the clock and the random source were to repeat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Mint a fresh entry id (32 lowercase hex chars).
    pub fn new() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let seq = ENTRY_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(nanos.to_le_bytes());
        hasher.update(uuid::Uuid::new_v4().as_bytes());
        hasher.update(seq.to_le_bytes());

        Self(hex::encode(&hasher.finalize()[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One recorded decision in the hash chain.
///
/// `prev_hash` points at the previous entry's `payload_hash` (or
/// `GENESIS_HASH`). `entry_hash` binds the metadata fields to that position,
/// so rewriting `rule_id`, `effect`, or `actor_id` after the fact is caught
/// by verification even though those fields are not propagated forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: EntryId,

    /// Wall-clock time (UTC) the entry was created.
    pub timestamp: DateTime<Utc>,

    /// Tenant scope. Opaque to the audit log.
    pub org_id: Option<String>,

    /// The policy rule that produced the decision.
    pub rule_id: String,

    pub effect: Effect,

    /// Who or what triggered the decision.
    pub actor_id: Option<String>,

    /// Salted SHA-256 (hex) of the canonical redacted payload.
    pub payload_hash: String,

    /// Chain back-reference: the previous entry's `payload_hash`.
    pub prev_hash: String,

    /// Salted SHA-256 (hex) over the entry's metadata and both hashes.
    pub entry_hash: String,

    /// Allow-listed payload fields only. Never the raw payload.
    pub redacted_payload: Map<String, Value>,
}

/// A Merkle root committed over one completed batch of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleCheckpoint {
    /// Root of the tree built over the batch's payload hashes.
    pub merkle_root: String,

    /// Depth of that tree; `ceil(log2(leaf_count))`.
    pub height: u32,

    /// Store index of the last entry in the batch.
    pub last_index: usize,

    /// Number of entries in the batch, i.e. the batch size at creation time.
    pub leaf_count: usize,

    pub timestamp: DateTime<Utc>,
}

impl MerkleCheckpoint {
    /// Store index of the first entry in the batch.
    ///
    /// `None` when the checkpoint claims more leaves than precede it, which
    /// only happens for a corrupted record.
    pub fn first_index(&self) -> Option<usize> {
        self.last_index.checked_add(1)?.checked_sub(self.leaf_count)
    }

    /// True if the entry at `index` is one of this checkpoint's leaves.
    pub fn covers(&self, index: usize) -> bool {
        self.first_index()
            .is_some_and(|first| (first..=self.last_index).contains(&index))
    }
}
