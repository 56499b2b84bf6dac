//! In-memory implementation of `AuditLog`.
//!
//! `InMemoryAuditLog` keeps entries and checkpoints in two `Vec`s behind a
//! single `RwLock`. An append holds the write guard from predecessor lookup
//! through checkpointing, so appends are totally ordered and two appends can
//! never reach the same batch boundary. Queries and verification take read
//! guards and run concurrently with each other.
//!
//! Durability is the persistence layer's job: it stores what
//! `export_snapshot()` returns and replays it with `restore()` on restart.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tracing::{debug, info, warn};

use attest_contracts::{
    decision::AppendRequest,
    entry::{AuditEntry, MerkleCheckpoint, GENESIS_HASH},
    error::{AttestError, AttestResult},
    query::{QueryFilter, SanitizedEntry},
    verify::VerifyReport,
};
use attest_core::traits::{AuditLog, Clock, SystemClock};

use crate::{
    chain::{build_entry, resolve_prev_hash},
    config::AuditConfig,
    event::AuditSnapshot,
    hasher::CanonicalHasher,
    merkle::{batch_leaves, inclusion_proof, verify_proof, Checkpointer, MerkleProof},
    query::run_query,
    verify::verify_log,
};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryAuditLog`.
///
/// Both sequences only ever grow.
#[derive(Debug, Default)]
pub(crate) struct AuditState {
    /// All entries, in append order.
    pub(crate) entries: Vec<AuditEntry>,

    /// All checkpoints, in creation order.
    pub(crate) checkpoints: Vec<MerkleCheckpoint>,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An in-memory, append-only decision log backed by a SHA-256 hash chain
/// and periodic Merkle checkpoints.
///
/// Cloning is cheap and clones share the same underlying log.
#[derive(Clone)]
pub struct InMemoryAuditLog {
    hasher: CanonicalHasher,
    checkpointer: Checkpointer,
    clock: Arc<dyn Clock>,
    pub(crate) state: Arc<RwLock<AuditState>>,
}

impl InMemoryAuditLog {
    /// Create an empty log stamped by the system clock.
    ///
    /// Returns `AttestError::ConfigError` if `config` is invalid.
    pub fn new(config: &AuditConfig) -> AttestResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an empty log stamped by `clock`.
    pub fn with_clock(config: &AuditConfig, clock: Arc<dyn Clock>) -> AttestResult<Self> {
        config.validate()?;
        Ok(Self {
            hasher: CanonicalHasher::new(config.salt.clone()),
            checkpointer: Checkpointer::new(config.batch_size),
            clock,
            state: Arc::new(RwLock::new(AuditState::default())),
        })
    }

    /// Rebuild a log from a persisted snapshot.
    ///
    /// The stored sequences are taken as-is. A snapshot whose `head_hash`
    /// disagrees with its last entry is rejected as truncated or spliced. A
    /// snapshot checkpointed with a different batch size than `config` is
    /// rejected too, since later appends would checkpoint misaligned
    /// batches. A snapshot that merely fails verification is loaded with a
    /// warning so the caller can inspect it.
    pub fn restore(
        config: &AuditConfig,
        clock: Arc<dyn Clock>,
        snapshot: AuditSnapshot,
    ) -> AttestResult<Self> {
        let expected_head = snapshot
            .entries
            .last()
            .map(|e| e.payload_hash.as_str())
            .unwrap_or(GENESIS_HASH);
        if snapshot.head_hash != expected_head {
            return Err(AttestError::SnapshotError {
                reason: format!(
                    "head hash {} does not match last entry hash {}",
                    snapshot.head_hash, expected_head
                ),
            });
        }

        if let Some(cp) = snapshot
            .checkpoints
            .iter()
            .find(|cp| cp.leaf_count != config.batch_size)
        {
            return Err(AttestError::SnapshotError {
                reason: format!(
                    "checkpoint at index {} covers {} entries but batch_size is {}",
                    cp.last_index, cp.leaf_count, config.batch_size
                ),
            });
        }

        let log = Self::with_clock(config, clock)?;
        let report = verify_log(
            &log.hasher,
            &snapshot.entries,
            &snapshot.checkpoints,
            log.batch_size(),
        );
        if !report.valid {
            warn!(
                error_count = report.errors.len(),
                "restored audit log failed verification"
            );
        }

        info!(
            entry_count = snapshot.entries.len(),
            checkpoint_count = snapshot.checkpoints.len(),
            "audit log restored"
        );

        {
            let mut state = log.state.write().map_err(|e| AttestError::SnapshotError {
                reason: format!("audit state lock poisoned: {}", e),
            })?;
            state.entries = snapshot.entries;
            state.checkpoints = snapshot.checkpoints;
        }
        Ok(log)
    }

    // Entries are never mutated after being pushed, so a guard recovered
    // from a poisoned lock still sees consistent data.
    fn read(&self) -> RwLockReadGuard<'_, AuditState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Export every entry and checkpoint for the persistence layer.
    pub fn export_snapshot(&self) -> AuditSnapshot {
        let state = self.read();
        AuditSnapshot::new(
            state.entries.clone(),
            state.checkpoints.clone(),
            self.clock.now(),
        )
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.checkpointer.batch_size()
    }

    /// The hash the next append will link to.
    pub fn head_hash(&self) -> String {
        self.read()
            .entries
            .last()
            .map(|e| e.payload_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string())
    }

    /// A copy of every entry, in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.read().entries.clone()
    }

    /// A copy of every checkpoint, in creation order.
    pub fn checkpoints(&self) -> Vec<MerkleCheckpoint> {
        self.read().checkpoints.clone()
    }

    /// Prove that the entry at `index` belongs to its checkpointed batch.
    ///
    /// Returns `None` for entries not yet covered by a checkpoint.
    pub fn inclusion_proof(&self, index: usize) -> Option<MerkleProof> {
        let state = self.read();
        let checkpoint = state.checkpoints.iter().find(|cp| cp.covers(index))?;
        let first = checkpoint.first_index()?;
        let batch = state.entries.get(first..=checkpoint.last_index)?;
        inclusion_proof(&self.hasher, &batch_leaves(batch), index - first)
    }

    /// True if `proof` is internally consistent and its root is one of this
    /// log's checkpoint roots.
    pub fn verify_inclusion(&self, proof: &MerkleProof) -> bool {
        verify_proof(&self.hasher, proof)
            && self
                .read()
                .checkpoints
                .iter()
                .any(|cp| cp.merkle_root == proof.root)
    }
}

// ── AuditLog impl ─────────────────────────────────────────────────────────────

impl AuditLog for InMemoryAuditLog {
    /// Append one decision to the hash chain.
    ///
    /// Redacts and hashes the payload, links to the head (or the override),
    /// computes the entry-binding digest, pushes the entry, and checkpoints
    /// the batch if this append completed one, all under the write guard.
    ///
    /// Returns `Err(InvalidHash)` for a malformed `prev_hash_override` and
    /// `Err(AuditWriteFailed)` if the lock is poisoned. Nothing is stored on
    /// error.
    fn append(&self, request: AppendRequest) -> AttestResult<AuditEntry> {
        let mut state = self.state.write().map_err(|e| AttestError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let prev_hash =
            resolve_prev_hash(request.prev_hash_override.as_deref(), state.entries.last())?;
        // One clock read per append: the entry and any checkpoint it
        // completes share a timestamp.
        let now = self.clock.now();
        let entry = build_entry(&self.hasher, &request, prev_hash, now);

        debug!(
            entry_id = %entry.id,
            index = state.entries.len(),
            rule_id = %entry.rule_id,
            effect = %entry.effect,
            payload_hash = %entry.payload_hash,
            "audit entry appended"
        );

        state.entries.push(entry.clone());

        if let Some(checkpoint) = self
            .checkpointer
            .maybe_checkpoint(&self.hasher, &state.entries, now)
        {
            info!(
                last_index = checkpoint.last_index,
                height = checkpoint.height,
                merkle_root = %checkpoint.merkle_root,
                "merkle checkpoint recorded"
            );
            state.checkpoints.push(checkpoint);
        }

        Ok(entry)
    }

    fn query(&self, filter: &QueryFilter) -> Vec<SanitizedEntry> {
        run_query(&self.hasher, &self.read().entries, filter)
    }

    fn latest_checkpoint(&self) -> Option<MerkleCheckpoint> {
        self.read().checkpoints.last().cloned()
    }

    fn verify(&self) -> VerifyReport {
        let state = self.read();
        let report = verify_log(
            &self.hasher,
            &state.entries,
            &state.checkpoints,
            self.batch_size(),
        );

        info!(
            entry_count = state.entries.len(),
            checkpoint_count = state.checkpoints.len(),
            valid = report.valid,
            "audit log verified"
        );
        report
    }
}
