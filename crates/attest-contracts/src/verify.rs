//! Integrity verification report.

use serde::{Deserialize, Serialize};

/// The result of replaying the chain and its checkpoints.
///
/// Advisory: a failing report is data for the caller to act on (alert,
/// quarantine), not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerifyReport {
    /// True only if `errors` is empty.
    pub valid: bool,
    /// One human-readable message per violation, in scan order.
    pub errors: Vec<String>,
}

impl VerifyReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// True if any error message names `id`.
    pub fn mentions(&self, id: &str) -> bool {
        self.errors.iter().any(|e| e.contains(id))
    }
}
