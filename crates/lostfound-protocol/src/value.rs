//! Forgiving field readers over untyped JSON.
//!
//! Backend payloads come in several generations of shape. Everything that
//! turns them into typed records goes through these helpers so a wrong-typed
//! or missing field defaults instead of failing the whole record.

use serde_json::{Map, Value};

static EMPTY_OBJECT: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();

/// Trimmed string value, or empty when absent or not a string.
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

/// Trimmed string value, `None` when the result would be empty.
pub fn optional_text(value: Option<&Value>) -> Option<String> {
    let text = text(value);
    if text.is_empty() { None } else { Some(text) }
}

/// Untrimmed string value, or empty when absent or not a string.
pub fn raw_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Array of trimmed, non-empty strings. Non-string entries are dropped.
pub fn text_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text(Some(item)))
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Identifier rendered as text. Accepts strings and integral numbers.
pub fn id_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.is_finite() => (f.trunc() as i64).to_string(),
            _ => String::new(),
        },
        other => text(other),
    }
}

/// Boolean value; strings `"true"`/`"1"` and non-zero numbers count as true.
pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
        _ => false,
    }
}

/// Non-negative integer value. Numeric strings are accepted.
pub fn count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

/// Object view of a value, or an empty object for anything else.
pub fn object_or_empty(value: Option<&Value>) -> &Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map,
        _ => EMPTY_OBJECT.get_or_init(Map::new),
    }
}

/// Array view of a value, or an empty slice for anything else.
pub fn array_or_empty(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}
