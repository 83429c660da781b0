//! Helpers for working with untyped `serde_json::Value` subjects.
//!
//! Patterns, extractors and scorers all operate on loosely-typed values. These
//! helpers pin down the handful of coercions the engines rely on so that every
//! component agrees on what "equal", "truthy" or "as text" means.

use serde_json::{Number, Value};

/// Convert an `f64` into a JSON number value.
///
/// Non-finite results (NaN, infinities) have no JSON representation and map to
/// `Value::Null`. Integral values are stored as integers so they print without a
/// trailing `.0`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        let i = n as i64;
        // Keep -0.0 as a float so the sign survives
        if i != 0 || n.is_sign_positive() {
            return Value::Number(Number::from(i));
        }
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Truthiness used by conditions, `!`, `&&` and `||`.
///
/// `null`, `false`, `0`, `""` are falsy; arrays and maps are always truthy,
/// even when empty.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric coercion. Returns NaN when the value has no numeric reading.
#[must_use]
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

/// Format a number the way it reads in source text (`1`, `1.5`, `-3`).
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        format!("{n}")
    }
}

/// Text coercion, used when a string-oriented tester sees a non-string value.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), format_number),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Strict equality between two values.
///
/// Values of different kinds are never equal. Numbers compare as `f64`, so `1`
/// and `1.0` are equal. Arrays and maps compare structurally.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| strict_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| strict_eq(v, other)))
        }
        _ => false,
    }
}

/// Short human-readable name of a value's kind, for error messages.
#[must_use]
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
