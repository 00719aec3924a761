//! Lenient parameter extraction.
//!
//! Every tunable accepts either an integer or a floating-point JSON number.
//! Missing or mistyped values fall back to the supplied default; nothing in
//! here returns an error.

use serde_json::Value;

use super::Params;

/// Integer tunable. Floats are truncated toward zero.
pub fn int(params: &Params, key: &str, default: i64) -> i64 {
    match params.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        _ => default,
    }
}

/// Floating-point tunable. Integers are widened.
pub fn float(params: &Params, key: &str, default: f64) -> f64 {
    match params.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        _ => default,
    }
}

/// String tunable.
pub fn string(params: &Params, key: &str, default: &str) -> String {
    match params.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}
