//! Values and variable scopes.
//!
//! A [`Scope`] is the set of named bindings an expression is evaluated against.
//! Every scope carries the implicit `ans` binding, which holds the most recent
//! successful result of its session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the implicit "previous answer" binding.
pub const ANS: &str = "ans";

/// Significant digits used when displaying numbers.
const DISPLAY_PRECISION: usize = 14;

/// A result or scope value.
///
/// Numbers are what the engine produces. Text and structured values only come
/// from persisted legacy data (error strings stored as results, serialized math
/// objects) and are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Structured(serde_json::Value),
}

impl Value {
    /// Returns the numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(text) => f.write_str(text),
            Value::Structured(json) => write!(f, "{}", json),
        }
    }
}

/// Formats a number the way a calculator displays it.
///
/// Rounds to 14 significant digits, so `0.1 + 0.2` shows as `0.3`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let rounded: f64 = format!("{:.*e}", DISPLAY_PRECISION - 1, n)
        .parse()
        .unwrap_or(n);
    format!("{}", rounded)
}

/// Variable bindings visible to expression evaluation.
///
/// Invariant: always contains [`ANS`].
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    bindings: BTreeMap<String, Value>,
}

impl Scope {
    /// Creates the default scope `{ans: 0}`.
    pub fn new() -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(ANS.to_string(), Value::Number(0.0));
        Self { bindings }
    }

    /// Builds a scope from persisted bindings, adding `ans = 0` if it is missing.
    pub fn from_bindings(mut bindings: BTreeMap<String, Value>) -> Self {
        bindings
            .entry(ANS.to_string())
            .or_insert(Value::Number(0.0));
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// The most recent successful result.
    pub fn ans(&self) -> &Value {
        // `ans` is inserted by every constructor and never removed.
        &self.bindings[ANS]
    }

    pub fn set_ans(&mut self, value: Value) {
        self.bindings.insert(ANS.to_string(), value);
    }

    pub fn bindings(&self) -> &BTreeMap<String, Value> {
        &self.bindings
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }

    /// Returns the bindings of `self` that differ from `base`, excluding `ans`.
    pub fn changed_since(&self, base: &Scope) -> BTreeMap<String, Value> {
        self.bindings
            .iter()
            .filter(|(name, value)| name.as_str() != ANS && base.get(name) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
