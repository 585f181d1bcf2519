//! Property normalization.
//!
//! The declarative input format carries every leaf value as a string, so a
//! rate limit arrives as `"2000"` and a negation flag as `"false"`. This
//! module coerces string leaves back into their semantic types, recursing
//! through nested mappings and sequences, so that downstream diffing
//! compares values of identical type.
//!
//! Coercion rules for a string leaf:
//! - `"true"` / `"false"` (case-insensitive) become booleans,
//! - strings parseable as base-10 integers become numbers,
//! - anything else stays a string.
//!
//! Non-string, non-container leaves pass through unchanged.

use serde_json::Value;

/// Recursively normalize a property tree.
///
/// Applied to both the desired-state bag and, on update, the previous-state
/// bag, so both sides of a diff see identical semantic types.
pub fn normalize_properties(value: Value) -> Value {
    match value {
        Value::String(s) => coerce_scalar(s),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_properties).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (key, normalize_properties(val)))
                .collect(),
        ),
        other => other,
    }
}

fn coerce_scalar(s: String) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(n) = s.parse::<i64>() {
        return Value::Number(n.into());
    }
    Value::String(s)
}
