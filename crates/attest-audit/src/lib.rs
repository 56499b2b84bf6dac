//! # attest-audit
//!
//! Tamper-evident decision audit log: allow-list redaction, salted SHA-256
//! hash chain, and Merkle checkpoints every `batch_size` appends.
//!
//! ## Overview
//!
//! Every decision passed to `append` is redacted to its allow-listed fields,
//! hashed canonically, and linked to the previous entry's payload hash. An
//! entry-binding digest ties the decision's metadata to its chain position,
//! so rewriting a stored `rule_id` or `effect` is detected by `verify`.
//! Readers get `SanitizedEntry` values, which carry per-field digests only.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attest_audit::{AuditConfig, InMemoryAuditLog};
//! use attest_contracts::{AppendRequest, Effect, QueryFilter};
//! use attest_core::AuditLog;
//!
//! let log = InMemoryAuditLog::new(&AuditConfig::new("salt").with_batch_size(3))?;
//! log.append(AppendRequest::new("r1", Effect::Allow))?;
//!
//! assert!(log.verify().valid);
//! let page = log.query(&QueryFilter::new().limit(10));
//! ```

pub mod chain;
pub mod config;
pub mod event;
pub mod hasher;
pub mod memory;
pub mod merkle;
pub mod query;
pub mod redact;
pub mod verify;

#[cfg(test)]
mod testutil;

pub use config::{AuditConfig, DEFAULT_BATCH_SIZE};
pub use event::AuditSnapshot;
pub use hasher::CanonicalHasher;
pub use memory::InMemoryAuditLog;
pub use merkle::{MerkleProof, ProofStep, Side};

// ── Tests ─────────────────────────────────────────────────────────────────────
