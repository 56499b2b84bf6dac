//! Decision effects and append requests.
//!
//! A decision producer (policy or routing engine) hands one `AppendRequest`
//! to the audit log per decision it makes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AttestError;

/// The outcome of a policy or routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    Allow,
    Block,
    Route,
    RequireOverride,
    WarnRoute,
}

impl Effect {
    /// The wire name of this effect, as it appears in hashes and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "ALLOW",
            Effect::Block => "BLOCK",
            Effect::Route => "ROUTE",
            Effect::RequireOverride => "REQUIRE_OVERRIDE",
            Effect::WarnRoute => "WARN_ROUTE",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ALLOW" => Ok(Effect::Allow),
            "BLOCK" => Ok(Effect::Block),
            "ROUTE" => Ok(Effect::Route),
            "REQUIRE_OVERRIDE" => Ok(Effect::RequireOverride),
            "WARN_ROUTE" => Ok(Effect::WarnRoute),
            _ => Err(AttestError::UnknownEffect {
                value: s.to_string(),
            }),
        }
    }
}

/// Everything the audit log needs to record one decision.
///
/// The producer chooses `allow_list`; fields not named there never reach
/// the hash or the store. Leaving it unset records no payload fields at all.
///
/// ```rust,ignore
/// let req = AppendRequest::new("r1", Effect::Allow)
///     .org("acme")
///     .actor("user-7")
///     .payload(json!({ "name": "Bob", "ssn": "123-45-6789" }))
///     .allow(["name"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    /// Tenant scope. Opaque to the audit log.
    pub org_id: Option<String>,
    /// The policy rule that produced the decision.
    pub rule_id: String,
    /// The decision outcome.
    pub effect: Effect,
    /// Who or what triggered the decision.
    pub actor_id: Option<String>,
    /// The raw decision payload, before redaction.
    pub payload: Map<String, Value>,
    /// Payload fields that may be retained. `None` retains nothing.
    pub allow_list: Option<Vec<String>>,
    /// Explicit chain predecessor; replaces the store's head hash when set.
    pub prev_hash_override: Option<String>,
}

impl AppendRequest {
    pub fn new(rule_id: impl Into<String>, effect: Effect) -> Self {
        Self {
            org_id: None,
            rule_id: rule_id.into(),
            effect,
            actor_id: None,
            payload: Map::new(),
            allow_list: None,
            prev_hash_override: None,
        }
    }

    pub fn org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Set the raw payload. Non-object values are recorded as an empty map.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = match payload {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    pub fn allow<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn prev_hash(mut self, prev_hash: impl Into<String>) -> Self {
        self.prev_hash_override = Some(prev_hash.into());
        self
    }
}
