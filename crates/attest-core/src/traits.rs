//! Core trait definitions for the attest audit log.
//!
//! - `AuditLog`: trusted sink for policy and routing decisions
//! - `Clock`: wall-clock source, swappable for deterministic tests
//!
//! Producers only ever see `AuditLog::append`. Presentation layers only see
//! `query` and `latest_checkpoint`, which never expose raw payload values.

use chrono::{DateTime, Utc};

use attest_contracts::{
    decision::AppendRequest,
    entry::{AuditEntry, MerkleCheckpoint},
    error::AttestResult,
    query::{QueryFilter, SanitizedEntry},
    verify::VerifyReport,
};

/// An append-only, hash-chained log of decisions.
///
/// Appends are globally ordered: implementations must serialize them so two
/// appends never link to the same predecessor. Reads may run concurrently
/// with each other.
pub trait AuditLog: Send + Sync {
    /// Redact, hash, link, and store one decision.
    ///
    /// Returns the stored entry. May emit a Merkle checkpoint as a side
    /// effect when the append completes a batch.
    fn append(&self, request: AppendRequest) -> AttestResult<AuditEntry>;

    /// Return a page of sanitized entries matching `filter`, in append order.
    fn query(&self, filter: &QueryFilter) -> Vec<SanitizedEntry>;

    /// The most recent Merkle checkpoint, if any batch has completed.
    fn latest_checkpoint(&self) -> Option<MerkleCheckpoint>;

    /// Replay the chain and its checkpoints looking for tampering.
    ///
    /// Read-only. A failing report is not an error.
    fn verify(&self) -> VerifyReport;
}

/// A source of timestamps for entries and checkpoints.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// `Clock` backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
