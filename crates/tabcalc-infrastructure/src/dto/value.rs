//! Persisted form of values and scopes.
//!
//! JSON has no representation for non-finite numbers, so those are written
//! as the strings `"Infinity"`, `"-Infinity"` and `"NaN"` and read back as
//! numbers.

use serde_json::Number;
use std::collections::BTreeMap;
use tabcalc_core::value::{Scope, Value, format_number};

/// Persisted scope: variable name to JSON value.
pub type ScopeDto = BTreeMap<String, serde_json::Value>;

pub fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Number(n) => match Number::from_f64(*n) {
            Some(number) => serde_json::Value::Number(number),
            None => serde_json::Value::String(format_number(*n)),
        },
        Value::Text(text) => serde_json::Value::String(text.clone()),
        Value::Structured(json) => json.clone(),
    }
}

pub fn decode_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Number(number) => match number.as_f64() {
            Some(n) => Value::Number(n),
            None => Value::Structured(serde_json::Value::Number(number)),
        },
        serde_json::Value::String(text) => match text.as_str() {
            "Infinity" => Value::Number(f64::INFINITY),
            "-Infinity" => Value::Number(f64::NEG_INFINITY),
            "NaN" => Value::Number(f64::NAN),
            _ => Value::Text(text),
        },
        other => Value::Structured(other),
    }
}

pub fn encode_scope(scope: &Scope) -> ScopeDto {
    scope
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Decodes a persisted scope. A missing `ans` is added as `0`.
pub fn decode_scope(dto: ScopeDto) -> Scope {
    Scope::from_bindings(
        dto.into_iter()
            .map(|(name, json)| (name, decode_value(json)))
            .collect(),
    )
}
