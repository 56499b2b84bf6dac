//! Filtered, paginated, sanitized reads.

use attest_contracts::{
    entry::AuditEntry,
    query::{QueryFilter, SanitizedEntry},
};

use crate::{hasher::CanonicalHasher, redact::hashed_fields};

/// Reduce an entry to the view readers are allowed to see.
pub fn sanitize(hasher: &CanonicalHasher, entry: &AuditEntry) -> SanitizedEntry {
    SanitizedEntry {
        id: entry.id.clone(),
        timestamp: entry.timestamp,
        org_id: entry.org_id.clone(),
        rule_id: entry.rule_id.clone(),
        effect: entry.effect,
        actor_id: entry.actor_id.clone(),
        hashed_fields: hashed_fields(&entry.redacted_payload, hasher),
    }
}

/// Filter `entries`, then skip `offset` and take `limit`, keeping append
/// order. An inverted time window yields nothing.
pub fn run_query(
    hasher: &CanonicalHasher,
    entries: &[AuditEntry],
    filter: &QueryFilter,
) -> Vec<SanitizedEntry> {
    if filter.is_empty_window() {
        return Vec::new();
    }

    entries
        .iter()
        .filter(|entry| filter.matches(entry))
        .skip(filter.offset)
        .take(filter.limit)
        .map(|entry| sanitize(hasher, entry))
        .collect()
}
