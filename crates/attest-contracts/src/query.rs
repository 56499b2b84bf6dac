//! Query filters and the sanitized entry view handed to presentation layers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    decision::Effect,
    entry::{AuditEntry, EntryId},
};

/// Page size used when a filter does not set one.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Conjunctive filter over the audit log.
///
/// Every field that is set must match. `from` and `to` are inclusive. A
/// window with `to` earlier than `from` matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub org_id: Option<String>,
    pub rule_id: Option<String>,
    pub effect: Option<Effect>,
    /// Maximum number of results, applied after filtering.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Number of matching entries to skip, applied after filtering.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            org_id: None,
            rule_id: None,
            effect: None,
            limit: DEFAULT_QUERY_LIMIT,
            offset: 0,
        }
    }
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    pub fn rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// True if the time window can never match, i.e. `to < from`.
    pub fn is_empty_window(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if to < from)
    }

    /// True if `entry` satisfies every filter that is set.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if self.from.is_some_and(|from| entry.timestamp < from) {
            return false;
        }
        if self.to.is_some_and(|to| entry.timestamp > to) {
            return false;
        }
        if let Some(org_id) = &self.org_id {
            if entry.org_id.as_deref() != Some(org_id.as_str()) {
                return false;
            }
        }
        if let Some(rule_id) = &self.rule_id {
            if &entry.rule_id != rule_id {
                return false;
            }
        }
        if let Some(effect) = self.effect {
            if entry.effect != effect {
                return false;
            }
        }
        true
    }
}

/// An audit entry as shown to readers: metadata plus per-field digests.
///
/// `hashed_fields` maps each retained payload field to the salted hash of
/// its value. Raw values never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedEntry {
    pub id: EntryId,
    pub timestamp: DateTime<Utc>,
    pub org_id: Option<String>,
    pub rule_id: String,
    pub effect: Effect,
    pub actor_id: Option<String>,
    pub hashed_fields: BTreeMap<String, String>,
}
