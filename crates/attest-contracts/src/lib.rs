//! # attest-contracts
//!
//! Shared types and contracts for the attest decision audit log.
//!
//! All crates in the workspace import from here. No hashing or storage logic
//! lives in this crate, only data definitions and error types.

pub mod decision;
pub mod entry;
pub mod error;
pub mod query;
pub mod verify;

pub use decision::{AppendRequest, Effect};
pub use entry::{AuditEntry, EntryId, MerkleCheckpoint, GENESIS_HASH};
pub use error::{AttestError, AttestResult};
pub use query::{QueryFilter, SanitizedEntry, DEFAULT_QUERY_LIMIT};
pub use verify::VerifyReport;
