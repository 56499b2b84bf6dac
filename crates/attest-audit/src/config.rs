//! TOML-driven audit log configuration.
//!
//! ```toml
//! batch_size = 1000
//! salt = "deployment-secret"
//! # or, to keep the secret out of the file:
//! # salt_env = "ATTEST_SALT"
//! ```
//!
//! A configuration is validated before any log is built from it. A zero
//! batch size or an empty salt is fatal.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

use attest_contracts::error::{AttestError, AttestResult};

/// Batch size used when the configuration does not set one.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Settings for one audit log.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Number of appends per Merkle checkpoint. Must be at least 1.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Deployment-wide secret appended to every hash input.
    #[serde(default)]
    pub salt: String,

    /// Name of an environment variable holding the salt. Read once at load
    /// time when `salt` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt_env: Option<String>,
}

impl AuditConfig {
    /// A configuration with the default batch size.
    pub fn new(salt: impl Into<String>) -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            salt: salt.into(),
            salt_env: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Parse `s` as TOML, resolve `salt_env`, and validate.
    ///
    /// Returns `AttestError::ConfigError` if the TOML is malformed, names an
    /// unknown key, or yields an invalid configuration.
    pub fn from_toml_str(s: &str) -> AttestResult<Self> {
        let mut config: AuditConfig = toml::from_str(s).map_err(|e| AttestError::ConfigError {
            reason: format!("failed to parse audit config TOML: {}", e),
        })?;
        config.resolve_salt_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML audit configuration.
    pub fn from_file(path: &Path) -> AttestResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AttestError::ConfigError {
            reason: format!("failed to read audit config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject configurations no log may be built from.
    pub fn validate(&self) -> AttestResult<()> {
        if self.batch_size == 0 {
            return Err(AttestError::ConfigError {
                reason: "batch_size must be at least 1".to_string(),
            });
        }
        if self.salt.is_empty() {
            return Err(AttestError::ConfigError {
                reason: "salt must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn resolve_salt_env(&mut self) -> AttestResult<()> {
        if !self.salt.is_empty() {
            return Ok(());
        }
        if let Some(var) = &self.salt_env {
            self.salt = std::env::var(var).map_err(|e| AttestError::ConfigError {
                reason: format!("salt_env '{}' is not usable: {}", var, e),
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfig")
            .field("batch_size", &self.batch_size)
            .field("salt", &"<redacted>")
            .field("salt_env", &self.salt_env)
            .finish()
    }
}
