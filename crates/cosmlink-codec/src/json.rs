//! Canonical JSON as used for legacy amino sign bytes
//!
//! Object keys are sorted recursively, no whitespace is emitted and the
//! characters `&`, `<` and `>` are escaped the way Go's `encoding/json` does.
//! The output does not depend on the `preserve_order` feature of serde_json.

use serde_json::Value;

/// Render `value` in canonical form
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Serialize any value and render it in canonical form
pub fn to_canonical_json<T: serde::Serialize>(value: &T) -> crate::Result<String> {
    Ok(canonical_json(&serde_json::to_value(value)?))
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    // serde_json never emits these characters inside an escape sequence
    let escaped = Value::String(s.to_string()).to_string();
    for c in escaped.chars() {
        match c {
            '&' => out.push_str("\\u0026"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            c => out.push(c),
        }
    }
}
