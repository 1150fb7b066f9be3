//! Canonical JSON hashing and fingerprint derivation.
//!
//! A job's fingerprint is the BLAKE3 hash of its canonicalized request JSON.
//! Canonicalization follows the same shape as RFC 8785 (JCS): object keys
//! sorted lexicographically, no insignificant whitespace, floats rounded to
//! six decimals before serialization so that two semantically-identical
//! requests always hash identically regardless of float formatting noise.

use serde_json::Value;

/// Computes the canonical BLAKE3 hash of a JSON value and returns it as a
/// lowercase hex string.
pub fn canonical_value_hash(value: &Value) -> String {
    let canonical = canonicalize_json(value);
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}

/// Canonicalizes a JSON value: sorted object keys, minimal number
/// formatting, no extra whitespace. Floats are rounded to 6 decimal places
/// first (see [`round_floats`]) so the fingerprint is stable across callers
/// that format the same number differently.
pub fn canonicalize_json(value: &Value) -> String {
    canonicalize_value(&round_floats(value))
}

/// Recursively rounds every float in a JSON value to 6 decimal places.
/// Integers and non-numeric values are left untouched.
pub fn round_floats(value: &Value) -> Value {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if n.as_i64().is_none() && n.as_u64().is_none() {
                    let rounded = (f * 1_000_000.0).round() / 1_000_000.0;
                    return serde_json::json!(rounded);
                }
            }
            value.clone()
        }
        Value::Array(arr) => Value::Array(arr.iter().map(round_floats).collect()),
        Value::Object(obj) => {
            Value::Object(obj.iter().map(|(k, v)| (k.clone(), round_floats(v))).collect())
        }
        other => other.clone(),
    }
}

fn canonicalize_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => format_string(s),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(canonicalize_value).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let pairs: Vec<String> = keys
                .iter()
                .map(|k| format!("{}:{}", format_string(k), canonicalize_value(&obj[*k])))
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    // Shortest round-tripping representation for the already-rounded float.
    let f = n.as_f64().unwrap_or(0.0);
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

fn format_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(canonical_value_hash(&a), canonical_value_hash(&b));
    }

    #[test]
    fn float_rounding_normalizes_noise() {
        let a = json!({"x": 0.1 + 0.2});
        let b = json!({"x": 0.300000});
        assert_eq!(canonical_value_hash(&a), canonical_value_hash(&b));
    }

    #[test]
    fn array_order_matters() {
        let a = json!([1, 2, 3]);
        let b = json!([3, 2, 1]);
        assert_ne!(canonical_value_hash(&a), canonical_value_hash(&b));
    }

    #[test]
    fn hash_is_64_hex_chars() {
        let hash = canonical_value_hash(&json!({"a": 1}));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
