//! Cache key resolution
//!
//! A key is either the caller's explicit override or a deterministic
//! function of endpoint, path and (when it participates in identity) the
//! request payload. Payloads are serialized canonically so that two
//! logically equal payloads always produce the same key, whatever order
//! their fields were inserted in.

use serde_json::Value;

/// Resolve the cache key for a request
pub fn resolve(
    explicit: Option<&str>,
    endpoint: &str,
    path: &str,
    payload: Option<&Value>,
) -> String {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return key.to_string();
    }

    match payload {
        Some(payload) => format!("{}{}/{}", endpoint, path, stable_serialize(payload)),
        None => format!("{}{}", endpoint, path),
    }
}

/// Resolve the cache key for a single record write, folding in its id
pub fn resolve_record(explicit: Option<&str>, endpoint: &str, path: &str, id: &str) -> String {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return key.to_string();
    }
    format!("{}{}{}", endpoint, path, id)
}

/// Compact JSON with object keys in sorted order
pub fn stable_serialize(value: &Value) -> String {
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
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
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
