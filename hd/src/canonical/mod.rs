//! Canonical JSON normalization and content addressing
//!
//! Semantically equivalent trees - reordered IN-lists, duplicate terms,
//! cosmetic whitespace - must hash identically, because the hash is the
//! plan/slice/task identity used for idempotent re-planning.
//!
//! Normalization rules:
//! 1. null / missing / empty string reduce to canonical null
//! 2. object keys sort lexicographically; keys with empty values are dropped
//! 3. arrays drop empties, dedupe by (type tag, serialized form), then sort
//!    by the same key; an array left empty reduces to null
//! 4. strings trim and collapse internal whitespace runs to one space
//! 5. numbers lose trailing fractional zeros (2.0 becomes 2)
//!
//! serde_json's default `Map` is BTreeMap-backed, which is what gives objects
//! their sorted-key serialization; the `preserve_order` feature must stay off.

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Canonicalization failures indicate an internal programming error, never
/// bad user input - expression trees are produced by this crate.
#[derive(Debug, Error)]
pub enum CanonicalError {
    #[error("canonical serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Content-addressed form of a JSON tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSnapshot {
    /// Normalized tree.
    pub value: Value,
    /// Serialized canonical form - exactly the hashed bytes.
    pub canonical_json: String,
    /// Hex SHA-256 of `canonical_json`.
    pub hash: String,
}

/// Normalize and hash a JSON tree.
pub fn snapshot(value: &Value) -> Result<CanonicalSnapshot, CanonicalError> {
    let value = canonicalize(value);
    let canonical_json = serde_json::to_string(&value)?;
    let hash = sha256_hex(canonical_json.as_bytes());
    Ok(CanonicalSnapshot {
        value,
        canonical_json,
        hash,
    })
}

/// Normalize a JSON tree without hashing it.
pub fn canonicalize(value: &Value) -> Value {
    normalize(value).unwrap_or(Value::Null)
}

/// Hash a composite identity key, joining the parts with '|'.
pub fn hash_parts(parts: &[&str]) -> String {
    sha256_hex(parts.join("|").as_bytes())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// Normalized value, or None when it reduced to empty.
fn normalize(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Number(n) => Some(normalize_number(n)),
        Value::String(s) => normalize_string(s),
        Value::Array(items) => normalize_array(items),
        Value::Object(fields) => normalize_object(fields),
    }
}

fn normalize_string(s: &str) -> Option<Value> {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(Value::String(collapsed))
    }
}

// Integral floats collapse to integers so 2.0 and 2 share one form. Floats
// beyond 2^53 keep their float representation rather than lose precision.
fn normalize_number(n: &Number) -> Value {
    if n.is_i64() || n.is_u64() {
        return Value::Number(n.clone());
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
            Value::Number(Number::from(f as i64))
        }
        Some(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        None => Value::Number(n.clone()),
    }
}

fn normalize_array(items: &[Value]) -> Option<Value> {
    let mut seen: Vec<(u8, String)> = Vec::new();
    let mut survivors: Vec<(u8, String, Value)> = Vec::new();

    for item in items {
        let Some(normalized) = normalize(item) else {
            continue;
        };
        let key = (type_tag(&normalized), encode(&normalized));
        if seen.contains(&key) {
            continue;
        }
        seen.push(key.clone());
        survivors.push((key.0, key.1, normalized));
    }

    if survivors.is_empty() {
        return None;
    }

    survivors.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    Some(Value::Array(survivors.into_iter().map(|(_, _, v)| v).collect()))
}

fn normalize_object(fields: &Map<String, Value>) -> Option<Value> {
    let mut out = Map::new();
    for (key, value) in fields {
        if let Some(normalized) = normalize(value) {
            out.insert(key.clone(), normalized);
        }
    }
    if out.is_empty() { None } else { Some(Value::Object(out)) }
}

// Ordering tag for array sorting: null < bool < number < string < object < array.
fn type_tag(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Object(_) => 4,
        Value::Array(_) => 5,
    }
}

fn encode(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
