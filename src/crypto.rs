//! Hashing primitives for TallyChain
//!
//! Blocks are hashed over a canonical JSON encoding: object keys are emitted
//! in lexicographic order at every nesting level and no insignificant
//! whitespace is written. Two nodes holding the same logical block therefore
//! always agree on its digest, whatever order the fields had in memory or on
//! the wire.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hash any serializable record over its canonical JSON encoding.
pub fn hash_canonical<T: Serialize>(record: &T) -> String {
    // Records hashed here are plain structs with string keys, so conversion
    // cannot fail; Null keeps the function total.
    let value = serde_json::to_value(record).unwrap_or_default();
    sha256_hex(canonical_json(&value).as_bytes())
}

/// Canonical text form of a JSON value (sorted keys, compact separators).
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
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
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Random 128-bit node identifier rendered as 32 hex characters.
pub fn generate_node_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
