//! Evaluation result model.
//!
//! An [`EvaluationResult`] is one entry of a session's history: the raw input
//! together with either the computed value or the diagnostic that explains why
//! evaluation failed.

use crate::value::Value;
use std::collections::BTreeMap;

/// The outcome of evaluating one expression.
///
/// Exactly one of a value or an error message exists, which is why the two
/// cases are variants rather than optional fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    Error(String),
}

/// One evaluated or failed expression.
///
/// Created once by the evaluator (or decoded from storage) and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    original: String,
    normalized_expression: String,
    display_form: String,
    outcome: Outcome,
    assignments: BTreeMap<String, Value>,
}

impl EvaluationResult {
    /// Creates a successful result.
    pub fn success(
        original: impl Into<String>,
        normalized_expression: impl Into<String>,
        display_form: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            original: original.into(),
            normalized_expression: normalized_expression.into(),
            display_form: display_form.into(),
            outcome: Outcome::Value(value),
            assignments: BTreeMap::new(),
        }
    }

    /// Creates a failed result. The textual forms stay empty.
    pub fn failure(original: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            normalized_expression: String::new(),
            display_form: String::new(),
            outcome: Outcome::Error(error_message.into()),
            assignments: BTreeMap::new(),
        }
    }

    /// Attaches the variable bindings an assignment produced.
    ///
    /// Ignored for failed results, which never affect a scope.
    pub fn with_assignments(mut self, assignments: BTreeMap<String, Value>) -> Self {
        if self.succeeded() {
            self.assignments = assignments;
        }
        self
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Value(_))
    }

    pub fn normalized_expression(&self) -> &str {
        &self.normalized_expression
    }

    pub fn display_form(&self) -> &str {
        &self.display_form
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Value(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Value(_) => None,
            Outcome::Error(message) => Some(message),
        }
    }

    pub fn assignments(&self) -> &BTreeMap<String, Value> {
        &self.assignments
    }

    /// Text inserted into the input line when the expression is picked from history.
    pub fn recall_text(&self) -> &str {
        &self.original
    }

    /// Text inserted into the input line when the result is picked; failures have none.
    pub fn result_text(&self) -> Option<String> {
        self.result().map(|value| value.to_string())
    }

    /// Source for formula rendering: TeX form, else normalized text, else the raw input.
    pub fn display_source(&self) -> &str {
        [&self.display_form, &self.normalized_expression, &self.original]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_result_and_no_error() {
        let entry = EvaluationResult::success("+5", "ans + 5", "ans+5", Value::Number(8.0));
        assert!(entry.succeeded());
        assert_eq!(entry.result(), Some(&Value::Number(8.0)));
        assert!(entry.error_message().is_none());
        assert_eq!(entry.result_text(), Some("8".to_string()));
    }

    #[test]
    fn test_failure_has_error_and_empty_forms() {
        let entry = EvaluationResult::failure("*", "Value expected (char 1)");
        assert!(!entry.succeeded());
        assert!(entry.result().is_none());
        assert_eq!(entry.error_message(), Some("Value expected (char 1)"));
        assert!(entry.normalized_expression().is_empty());
        assert!(entry.display_form().is_empty());
        assert!(entry.result_text().is_none());
    }

    #[test]
    fn test_failure_drops_assignments() {
        let mut assignments = BTreeMap::new();
        assignments.insert("x".to_string(), Value::Number(1.0));

        let entry = EvaluationResult::failure("x = ", "boom").with_assignments(assignments);
        assert!(entry.assignments().is_empty());
    }

    #[test]
    fn test_display_source_fallbacks() {
        let full = EvaluationResult::success("2/3", "2 / 3", "\\frac{2}{3}", Value::Number(0.5));
        assert_eq!(full.display_source(), "\\frac{2}{3}");

        let no_tex = EvaluationResult::success("1+1", "1 + 1", "", Value::Number(2.0));
        assert_eq!(no_tex.display_source(), "1 + 1");

        let failed = EvaluationResult::failure("1+", "Unexpected end");
        assert_eq!(failed.display_source(), "1+");
    }
}
