//! Allow-list redaction and the hashed-fields view.
//!
//! Redaction runs before anything is hashed or stored. A field is either
//! copied whole or dropped whole; nested values are never partially kept.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::hasher::CanonicalHasher;

/// Project `payload` onto the fields named in `allow_list`.
///
/// Fails closed: an absent or empty allow-list keeps nothing. Names in the
/// allow-list that the payload lacks are ignored.
pub fn redact(payload: &Map<String, Value>, allow_list: Option<&[String]>) -> Map<String, Value> {
    let Some(allowed) = allow_list else {
        return Map::new();
    };

    allowed
        .iter()
        .filter_map(|field| {
            payload
                .get(field)
                .map(|value| (field.clone(), value.clone()))
        })
        .collect()
}

/// Hash each retained field's value independently.
///
/// Strings are hashed as their raw bytes; every other value is hashed over
/// its canonical serialization. The result is safe to hand to readers.
pub fn hashed_fields(
    redacted: &Map<String, Value>,
    hasher: &CanonicalHasher,
) -> BTreeMap<String, String> {
    redacted
        .iter()
        .map(|(field, value)| {
            let digest = match value {
                Value::String(s) => hasher.digest_str(s),
                other => hasher.digest_value(other),
            };
            (field.clone(), digest)
        })
        .collect()
}
