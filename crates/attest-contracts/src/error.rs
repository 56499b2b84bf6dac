//! Error types for the attest audit log.
//!
//! Only construction and append can fail. Integrity violations are reported
//! through `VerifyReport`, never raised, and malformed query filters simply
//! match nothing.

use thiserror::Error;

/// The unified error type for the attest crates.
#[derive(Debug, Error)]
pub enum AttestError {
    /// A required configuration value is missing or invalid.
    ///
    /// Raised at construction time; an audit log is never built from a bad
    /// configuration.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The store could not accept an append.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A caller-supplied digest is not 64 lowercase hex characters.
    #[error("invalid hash for '{field}': {value}")]
    InvalidHash { field: String, value: String },

    /// A decision effect string did not name a known effect.
    #[error("unknown decision effect: {value}")]
    UnknownEffect { value: String },

    /// A persisted snapshot could not be replayed into memory.
    #[error("snapshot error: {reason}")]
    SnapshotError { reason: String },
}

/// Convenience alias used throughout the attest crates.
pub type AttestResult<T> = Result<T, AttestError>;
