//! Merkle trees over batches of payload hashes.
//!
//! Tree shape:
//! - 0 leaves: the root is `GENESIS_HASH`.
//! - 1 leaf: the root is the leaf itself.
//! - otherwise pair adjacent nodes left to right, duplicating the last node
//!   of an odd-length level, and hash each pair with
//!   `CanonicalHasher::combine` until one node remains.
//!
//! With that padding the depth of an `n`-leaf tree is exactly
//! `ceil(log2(n))`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use attest_contracts::entry::{AuditEntry, MerkleCheckpoint, GENESIS_HASH};

use crate::hasher::CanonicalHasher;

/// A computed root and the number of levels above the leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleRoot {
    pub root: String,
    pub depth: u32,
}

/// `ceil(log2(n))`, with 0 for zero or one leaf.
pub fn nominal_height(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

fn next_level(hasher: &CanonicalHasher, level: &[String]) -> Vec<String> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hasher.combine(left, right),
            [single] => hasher.combine(single, single),
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

/// Build the tree over `leaves` and return its root.
pub fn merkle_root(hasher: &CanonicalHasher, leaves: &[String]) -> MerkleRoot {
    let Some(first) = leaves.first() else {
        return MerkleRoot {
            root: GENESIS_HASH.to_string(),
            depth: 0,
        };
    };

    let mut level = leaves.to_vec();
    let mut depth = 0;
    while level.len() > 1 {
        level = next_level(hasher, &level);
        depth += 1;
    }

    MerkleRoot {
        root: level.pop().unwrap_or_else(|| first.clone()),
        depth,
    }
}

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One level of an inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub hash: String,
    pub side: Side,
}

/// Evidence that one leaf is part of a tree with a given root.
///
/// An external notary holding only the checkpoint root can check a single
/// entry with this, without the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the leaf within its batch.
    pub leaf_index: usize,
    pub leaf_hash: String,
    /// Siblings from the leaf level upward.
    pub siblings: Vec<ProofStep>,
    pub root: String,
}

/// Build an inclusion proof for `leaves[index]`.
///
/// Returns `None` when `index` is out of range.
pub fn inclusion_proof(
    hasher: &CanonicalHasher,
    leaves: &[String],
    index: usize,
) -> Option<MerkleProof> {
    let leaf_hash = leaves.get(index)?.clone();

    let mut siblings = Vec::new();
    let mut level = leaves.to_vec();
    let mut pos = index;
    while level.len() > 1 {
        let (sibling_pos, side) = if pos % 2 == 0 {
            (pos + 1, Side::Right)
        } else {
            (pos - 1, Side::Left)
        };
        // The last node of an odd level is paired with itself.
        let hash = level.get(sibling_pos).unwrap_or(&level[pos]).clone();
        siblings.push(ProofStep { hash, side });

        level = next_level(hasher, &level);
        pos /= 2;
    }

    Some(MerkleProof {
        leaf_index: index,
        leaf_hash,
        siblings,
        root: level.pop()?,
    })
}

/// Fold a proof's siblings into its leaf and compare with its root.
pub fn verify_proof(hasher: &CanonicalHasher, proof: &MerkleProof) -> bool {
    let computed = proof
        .siblings
        .iter()
        .fold(proof.leaf_hash.clone(), |acc, step| match step.side {
            Side::Right => hasher.combine(&acc, &step.hash),
            Side::Left => hasher.combine(&step.hash, &acc),
        });
    computed == proof.root
}

/// The leaves of a batch: each entry's `payload_hash`, in append order.
pub fn batch_leaves(batch: &[AuditEntry]) -> Vec<String> {
    batch.iter().map(|e| e.payload_hash.clone()).collect()
}

/// Emits a `MerkleCheckpoint` every `batch_size` appends.
#[derive(Debug, Clone, Copy)]
pub struct Checkpointer {
    batch_size: usize,
}

impl Checkpointer {
    /// `AuditConfig::validate` rejects a zero batch size before any log is
    /// built; a `Checkpointer` constructed directly with zero uses one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// True if a store holding `len` entries has just completed a batch.
    pub fn is_boundary(&self, len: usize) -> bool {
        len > 0 && len % self.batch_size == 0
    }

    /// Checkpoint the most recent batch if `entries` ends on a boundary.
    pub fn maybe_checkpoint(
        &self,
        hasher: &CanonicalHasher,
        entries: &[AuditEntry],
        now: DateTime<Utc>,
    ) -> Option<MerkleCheckpoint> {
        if !self.is_boundary(entries.len()) {
            return None;
        }
        let batch = &entries[entries.len() - self.batch_size..];
        Some(checkpoint_batch(hasher, batch, entries.len() - 1, now))
    }
}

/// Build the checkpoint for `batch`, whose last entry sits at `last_index`.
pub fn checkpoint_batch(
    hasher: &CanonicalHasher,
    batch: &[AuditEntry],
    last_index: usize,
    now: DateTime<Utc>,
) -> MerkleCheckpoint {
    let MerkleRoot { root, depth } = merkle_root(hasher, &batch_leaves(batch));

    debug!(
        last_index,
        leaf_count = batch.len(),
        height = depth,
        merkle_root = %root,
        "merkle root computed"
    );

    MerkleCheckpoint {
        merkle_root: root,
        height: depth,
        last_index,
        leaf_count: batch.len(),
        timestamp: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CanonicalHasher {
        CanonicalHasher::new("merkle-test")
    }

    fn leaves(n: usize) -> Vec<String> {
        let h = hasher();
        (0..n).map(|i| h.digest_str(&format!("leaf-{i}"))).collect()
    }

    #[test]
    fn empty_tree_root_is_genesis() {
        let root = merkle_root(&hasher(), &[]);
        assert_eq!(root.root, GENESIS_HASH);
        assert_eq!(root.depth, 0);
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let l = leaves(1);
        let root = merkle_root(&hasher(), &l);
        assert_eq!(root.root, l[0]);
        assert_eq!(root.depth, 0);
    }

    #[test]
    fn two_leaves_combine_left_then_right() {
        let h = hasher();
        let l = leaves(2);
        assert_eq!(merkle_root(&h, &l).root, h.combine(&l[0], &l[1]));
    }

    #[test]
    fn odd_level_duplicates_last_hash() {
        let h = hasher();
        let l = leaves(3);

        let left = h.combine(&l[0], &l[1]);
        let right = h.combine(&l[2], &l[2]);
        let expected = h.combine(&left, &right);

        let root = merkle_root(&h, &l);
        assert_eq!(root.root, expected);
        assert_eq!(root.depth, 2);
    }

    #[test]
    fn root_is_deterministic_and_order_sensitive() {
        let h = hasher();
        let l = leaves(7);
        assert_eq!(merkle_root(&h, &l), merkle_root(&h, &l.clone()));

        let mut swapped = l.clone();
        swapped.swap(0, 1);
        assert_ne!(merkle_root(&h, &l).root, merkle_root(&h, &swapped).root);
    }

    #[test]
    fn achieved_depth_equals_nominal_height() {
        let h = hasher();
        for n in 1..=33 {
            assert_eq!(
                merkle_root(&h, &leaves(n)).depth,
                nominal_height(n),
                "depth mismatch for {n} leaves"
            );
        }
    }

    #[test]
    fn nominal_height_is_ceil_log2() {
        assert_eq!(nominal_height(0), 0);
        assert_eq!(nominal_height(1), 0);
        assert_eq!(nominal_height(2), 1);
        assert_eq!(nominal_height(3), 2);
        assert_eq!(nominal_height(4), 2);
        assert_eq!(nominal_height(5), 3);
        assert_eq!(nominal_height(1000), 10);
        assert_eq!(nominal_height(1024), 10);
    }

    #[test]
    fn every_leaf_has_a_valid_inclusion_proof() {
        let h = hasher();
        for n in [1, 2, 3, 5, 8, 11] {
            let l = leaves(n);
            let root = merkle_root(&h, &l).root;
            for i in 0..n {
                let proof = inclusion_proof(&h, &l, i).unwrap();
                assert_eq!(proof.root, root, "proof root for leaf {i} of {n}");
                assert_eq!(proof.siblings.len() as u32, nominal_height(n));
                assert!(verify_proof(&h, &proof), "proof for leaf {i} of {n} must verify");
            }
        }
    }

    #[test]
    fn tampered_proof_fails() {
        let h = hasher();
        let l = leaves(6);
        let mut proof = inclusion_proof(&h, &l, 4).unwrap();

        proof.leaf_hash = h.digest_str("forged");
        assert!(!verify_proof(&h, &proof));

        let mut proof = inclusion_proof(&h, &l, 4).unwrap();
        proof.siblings[0].side = Side::Left;
        assert!(!verify_proof(&h, &proof));
    }

    #[test]
    fn inclusion_proof_out_of_range_is_none() {
        assert!(inclusion_proof(&hasher(), &leaves(4), 4).is_none());
        assert!(inclusion_proof(&hasher(), &[], 0).is_none());
    }

    #[test]
    fn checkpointer_fires_on_multiples_only() {
        let cp = Checkpointer::new(2);
        assert!(!cp.is_boundary(0));
        assert!(!cp.is_boundary(1));
        assert!(cp.is_boundary(2));
        assert!(!cp.is_boundary(3));
        assert!(cp.is_boundary(4));

        let every = Checkpointer::new(1);
        assert!(every.is_boundary(1) && every.is_boundary(2));
    }

    #[test]
    fn checkpointer_clamps_zero_batch_size() {
        assert_eq!(Checkpointer::new(0).batch_size(), 1);
    }
}
