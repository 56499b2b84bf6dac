//! Hash-chain construction.
//!
//! Two digests per entry, both from `CanonicalHasher`:
//!
//!   payload_hash = H(canonical(redacted_payload))
//!   entry_hash   = H(canonical({ actor_id, effect, org_id, payload_hash,
//!                                prev_hash, rule_id, timestamp }))
//!
//! `prev_hash` links to the previous entry's `payload_hash`. `entry_hash`
//! binds the metadata to that link; verification recomputes both.
//! Timestamps enter the hash as RFC 3339 with nanoseconds and a `Z` suffix.
//! Absent optional fields enter as JSON null.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use attest_contracts::{
    decision::{AppendRequest, Effect},
    entry::{is_hex_digest, AuditEntry, EntryId, GENESIS_HASH},
    error::{AttestError, AttestResult},
};

use crate::{hasher::CanonicalHasher, redact::redact};

/// The metadata an entry-binding digest commits to.
#[derive(Debug, Clone, Copy)]
pub struct EntryBinding<'a> {
    pub payload_hash: &'a str,
    pub prev_hash: &'a str,
    pub org_id: Option<&'a str>,
    pub rule_id: &'a str,
    pub effect: Effect,
    pub actor_id: Option<&'a str>,
    pub timestamp: DateTime<Utc>,
}

impl<'a> EntryBinding<'a> {
    /// The binding as stored on an existing entry.
    pub fn of(entry: &'a AuditEntry) -> Self {
        Self {
            payload_hash: &entry.payload_hash,
            prev_hash: &entry.prev_hash,
            org_id: entry.org_id.as_deref(),
            rule_id: &entry.rule_id,
            effect: entry.effect,
            actor_id: entry.actor_id.as_deref(),
            timestamp: entry.timestamp,
        }
    }

    fn to_map(self) -> Map<String, Value> {
        let opt = |v: Option<&str>| v.map_or(Value::Null, |s| Value::String(s.to_string()));

        let mut map = Map::new();
        map.insert("payload_hash".into(), Value::String(self.payload_hash.to_string()));
        map.insert("prev_hash".into(), Value::String(self.prev_hash.to_string()));
        map.insert("org_id".into(), opt(self.org_id));
        map.insert("rule_id".into(), Value::String(self.rule_id.to_string()));
        map.insert("effect".into(), Value::String(self.effect.as_str().to_string()));
        map.insert("actor_id".into(), opt(self.actor_id));
        map.insert(
            "timestamp".into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
        map
    }
}

/// Compute the entry-binding digest.
pub fn entry_hash(hasher: &CanonicalHasher, binding: EntryBinding<'_>) -> String {
    hasher.digest_map(&binding.to_map())
}

/// Choose the predecessor hash for a new entry.
///
/// An explicit override wins and must be a well-formed digest. Otherwise the
/// head entry's `payload_hash` is used, or `GENESIS_HASH` for an empty chain.
pub fn resolve_prev_hash(
    prev_hash_override: Option<&str>,
    head: Option<&AuditEntry>,
) -> AttestResult<String> {
    if let Some(prev) = prev_hash_override {
        if !is_hex_digest(prev) {
            return Err(AttestError::InvalidHash {
                field: "prev_hash_override".to_string(),
                value: prev.to_string(),
            });
        }
        return Ok(prev.to_string());
    }

    Ok(head
        .map(|entry| entry.payload_hash.clone())
        .unwrap_or_else(|| GENESIS_HASH.to_string()))
}

/// Redact, hash, and assemble a new entry linked to `prev_hash`.
pub fn build_entry(
    hasher: &CanonicalHasher,
    request: &AppendRequest,
    prev_hash: String,
    timestamp: DateTime<Utc>,
) -> AuditEntry {
    let redacted_payload = redact(&request.payload, request.allow_list.as_deref());
    let payload_hash = hasher.digest_map(&redacted_payload);

    let entry_hash = entry_hash(
        hasher,
        EntryBinding {
            payload_hash: &payload_hash,
            prev_hash: &prev_hash,
            org_id: request.org_id.as_deref(),
            rule_id: &request.rule_id,
            effect: request.effect,
            actor_id: request.actor_id.as_deref(),
            timestamp,
        },
    );

    AuditEntry {
        id: EntryId::new(),
        timestamp,
        org_id: request.org_id.clone(),
        rule_id: request.rule_id.clone(),
        effect: request.effect,
        actor_id: request.actor_id.clone(),
        payload_hash,
        prev_hash,
        entry_hash,
        redacted_payload,
    }
}
