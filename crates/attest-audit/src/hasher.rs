//! Canonical serialization and salted SHA-256 hashing.
//!
//! Every digest in the audit log comes from here. Input layout:
//!
//!   1. the canonical bytes (or raw bytes for strings and Merkle pairs)
//!   2. the deployment salt as UTF-8 bytes
//!
//! Canonical bytes are compact JSON with object keys sorted at every depth,
//! so two maps with the same content hash identically no matter how they
//! were built.

use std::fmt;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Append the canonical JSON encoding of `value` to `out`.
pub fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_map(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars have exactly one compact rendering; Display produces it.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_canonical_map(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(&map[key.as_str()], out);
    }
    out.push('}');
}

/// Canonical JSON of a whole value.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Canonical JSON of a field mapping.
pub fn canonical_map(map: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_canonical_map(map, &mut out);
    out
}

/// Salted SHA-256 hasher shared by every component of the log.
///
/// The salt is a deployment-wide secret; it is never printed.
#[derive(Clone)]
pub struct CanonicalHasher {
    salt: String,
}

impl CanonicalHasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// SHA-256 over `bytes || salt`, as 64 lowercase hex chars.
    pub fn digest_bytes(&self, bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hasher.update(self.salt.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Hash a string's bytes directly, without JSON quoting.
    pub fn digest_str(&self, s: &str) -> String {
        self.digest_bytes(s.as_bytes())
    }

    /// Hash the canonical serialization of a field mapping.
    pub fn digest_map(&self, map: &Map<String, Value>) -> String {
        self.digest_bytes(canonical_map(map).as_bytes())
    }

    /// Hash the canonical serialization of any JSON value.
    pub fn digest_value(&self, value: &Value) -> String {
        self.digest_bytes(canonical_json(value).as_bytes())
    }

    /// Parent of two Merkle nodes: hash of `left || right`.
    pub fn combine(&self, left: &str, right: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        hasher.update(self.salt.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for CanonicalHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalHasher")
            .field("salt", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn canonical_sorts_keys_at_every_depth() {
        let value = json!({ "b": 1, "a": { "z": true, "y": [ { "d": null, "c": "x" } ] } });
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"y":[{"c":"x","d":null}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn canonical_escapes_strings() {
        let value = json!({ "q\"k": "line\nbreak" });
        assert_eq!(canonical_json(&value), r#"{"q\"k":"line\nbreak"}"#);
    }

    #[test]
    fn digest_is_independent_of_insertion_order() {
        let hasher = CanonicalHasher::new("salt");

        let mut first = Map::new();
        first.insert("name".into(), json!("Bob"));
        first.insert("age".into(), json!(41));

        let mut second = Map::new();
        second.insert("age".into(), json!(41));
        second.insert("name".into(), json!("Bob"));

        assert_eq!(hasher.digest_map(&first), hasher.digest_map(&second));
    }

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        let hasher = CanonicalHasher::new("");
        // SHA-256 of the empty string.
        assert_eq!(
            hasher.digest_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn salt_changes_every_digest() {
        let a = CanonicalHasher::new("alpha");
        let b = CanonicalHasher::new("beta");
        let payload = map(json!({ "name": "Bob" }));

        assert_ne!(a.digest_map(&payload), b.digest_map(&payload));
        assert_ne!(a.digest_str("Bob"), b.digest_str("Bob"));
        assert_eq!(a.digest_map(&payload), a.digest_map(&payload));
    }

    #[test]
    fn digest_str_hashes_raw_bytes_not_json() {
        let hasher = CanonicalHasher::new("s");
        assert_eq!(hasher.digest_str("Bob"), hasher.digest_bytes(b"Bob"));
        assert_ne!(hasher.digest_str("Bob"), hasher.digest_value(&json!("Bob")));
    }

    #[test]
    fn combine_is_order_sensitive() {
        let hasher = CanonicalHasher::new("s");
        let l = hasher.digest_str("l");
        let r = hasher.digest_str("r");
        assert_ne!(hasher.combine(&l, &r), hasher.combine(&r, &l));
        assert_eq!(hasher.combine(&l, &r), hasher.digest_bytes(format!("{l}{r}").as_bytes()));
    }

    #[test]
    fn debug_never_prints_salt() {
        let hasher = CanonicalHasher::new("super-secret");
        assert!(!format!("{:?}", hasher).contains("super-secret"));
    }
}
