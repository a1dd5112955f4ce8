//! # Canonical JSON
//!
//! The byte form every digest in the mesh is computed over: compact
//! separators, object keys sorted at every level, and every character
//! outside printable ASCII escaped as `\uXXXX` (UTF-16 units, lowercase
//! hex). Peers hashing with `sort_keys` and ASCII-only output produce the
//! same bytes.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Canonical encoding of `value`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (key, item)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::String(s) => write_string(out, s),
        other => out.push_str(&other.to_string()),
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // Writing into a String cannot fail.
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_and_sorted() {
        assert_eq!(
            canonical_json(&json!({"b": [1, {"d": 1, "c": "s"}], "a": null})),
            r#"{"a":null,"b":[1,{"c":"s","d":1}]}"#
        );
    }

    #[test]
    fn test_non_ascii_escaped() {
        assert_eq!(canonical_json(&json!("café")), r#""caf\u00e9""#);
        assert_eq!(canonical_json(&json!({"ü": "€"})), r#"{"\u00fc":"\u20ac"}"#);
        // Astral characters become surrogate pairs.
        assert_eq!(canonical_json(&json!("😀")), r#""\ud83d\ude00""#);
    }

    #[test]
    fn test_control_characters_escaped() {
        assert_eq!(
            canonical_json(&json!("a\"b\\c\nd\u{01}\u{7f}")),
            r#""a\"b\\c\nd\u0001\u007f""#
        );
    }

    #[test]
    fn test_numbers_and_literals() {
        assert_eq!(canonical_json(&json!([1, -2, 1.5, true, false])), "[1,-2,1.5,true,false]");
    }
}
