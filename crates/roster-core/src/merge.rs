//! Shallow merging of JSON object columns.

use serde_json::{Map, Value};

/// A JSON object column (`names`, `demographics`, `contact_info`, ...).
pub type JsonMap = Map<String, Value>;

/// Merge `incoming` into `existing` key by key. Top-level keys from
/// `incoming` replace those in `existing` wholesale, nested objects are not
/// merged recursively, and keys absent from `incoming` are kept.
pub fn merge_shallow(existing: &mut JsonMap, incoming: JsonMap) {
  for (key, value) in incoming {
    existing.insert(key, value);
  }
}

/// Unwrap a `serde_json::json!` object literal into a [`JsonMap`].
/// Non-object values produce an empty map.
pub fn into_map(value: Value) -> JsonMap {
  match value {
    Value::Object(map) => map,
    _ => JsonMap::new(),
  }
}
