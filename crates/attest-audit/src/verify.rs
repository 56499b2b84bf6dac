//! Chain and checkpoint replay.
//!
//! Three checks, all collected rather than short-circuited so an operator
//! sees every violation in one pass:
//!
//! 1. **Linkage**: for every entry after the first, `prev_hash` equals the
//!    previous entry's `payload_hash`.
//! 2. **Content**: for every entry, `payload_hash` matches the recomputed
//!    hash of `redacted_payload`, and `entry_hash` matches the recomputed
//!    entry-binding digest.
//! 3. **Checkpoints**: there is exactly one checkpoint per completed batch,
//!    checkpoint `k` covers entries `k * batch_size ..= (k + 1) * batch_size - 1`
//!    with the matching height, and its root matches the root rebuilt from
//!    those entries.
//!
//! The first entry's `prev_hash` is not checked against genesis: a caller
//! may legitimately anchor a chain to an external hash.

use tracing::warn;

use attest_contracts::{
    entry::{AuditEntry, MerkleCheckpoint},
    verify::VerifyReport,
};

use crate::{
    chain::{entry_hash, EntryBinding},
    hasher::CanonicalHasher,
    merkle::{batch_leaves, merkle_root, nominal_height},
};

/// True if the entry's stored digests match its stored content.
pub fn entry_is_intact(hasher: &CanonicalHasher, entry: &AuditEntry) -> bool {
    hasher.digest_map(&entry.redacted_payload) == entry.payload_hash
        && entry_hash(hasher, EntryBinding::of(entry)) == entry.entry_hash
}

/// True if the checkpoint's root matches the entries it covers.
pub fn checkpoint_is_intact(
    hasher: &CanonicalHasher,
    entries: &[AuditEntry],
    checkpoint: &MerkleCheckpoint,
) -> bool {
    if checkpoint.leaf_count == 0 {
        return false;
    }
    let Some(first) = checkpoint.first_index() else {
        return false;
    };
    let Some(batch) = entries.get(first..=checkpoint.last_index) else {
        return false;
    };
    merkle_root(hasher, &batch_leaves(batch)).root == checkpoint.merkle_root
}

/// True if `checkpoint` sits where the `k`-th checkpoint of a log with
/// `batch_size` must sit, with the shape a batch of that size produces.
pub fn checkpoint_is_aligned(checkpoint: &MerkleCheckpoint, k: usize, batch_size: usize) -> bool {
    let expected_last = (k + 1)
        .checked_mul(batch_size)
        .and_then(|end| end.checked_sub(1));

    expected_last == Some(checkpoint.last_index)
        && checkpoint.leaf_count == batch_size
        && checkpoint.height == nominal_height(batch_size)
}

/// Replay `entries` and `checkpoints` and report every violation found.
pub fn verify_log(
    hasher: &CanonicalHasher,
    entries: &[AuditEntry],
    checkpoints: &[MerkleCheckpoint],
    batch_size: usize,
) -> VerifyReport {
    let batch_size = batch_size.max(1);
    let mut errors = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 && entry.prev_hash != entries[i - 1].payload_hash {
            warn!(entry_id = %entry.id, index = i, "hash chain broken");
            errors.push(format!("Hash chain broken at entry {}", entry.id));
        }

        if !entry_is_intact(hasher, entry) {
            warn!(entry_id = %entry.id, index = i, "entry hash mismatch");
            errors.push(format!("Entry hash mismatch for {}", entry.id));
        }
    }

    let expected = entries.len() / batch_size;
    if checkpoints.len() != expected {
        warn!(
            expected,
            found = checkpoints.len(),
            "checkpoint count mismatch"
        );
        errors.push(format!(
            "Checkpoint count mismatch: expected {}, found {}",
            expected,
            checkpoints.len()
        ));
    }

    for (k, checkpoint) in checkpoints.iter().enumerate() {
        if !checkpoint_is_aligned(checkpoint, k, batch_size) {
            warn!(
                checkpoint = k,
                last_index = checkpoint.last_index,
                leaf_count = checkpoint.leaf_count,
                "checkpoint misaligned"
            );
            errors.push(format!(
                "Checkpoint {} misaligned at index {}",
                k, checkpoint.last_index
            ));
        } else if !checkpoint_is_intact(hasher, entries, checkpoint) {
            warn!(
                last_index = checkpoint.last_index,
                merkle_root = %checkpoint.merkle_root,
                "checkpoint root mismatch"
            );
            errors.push(format!(
                "Checkpoint root mismatch at index {}",
                checkpoint.last_index
            ));
        }
    }

    VerifyReport::from_errors(errors)
}
