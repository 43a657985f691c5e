//! Expression evaluation pipeline.
//!
//! Turns raw user input into an [`EvaluationResult`]. Parse and evaluation
//! errors never escape from here; they become failed results.

use crate::engine::{MathEngine, ParseError, ParsedNode};
use crate::evaluation::EvaluationResult;
use crate::value::{ANS, Scope};
use std::sync::Arc;

/// Evaluates expressions against a session scope.
///
/// The caller's scope is never modified. Evaluation runs on a working copy and
/// any bindings it produced are returned as the result's assignments, leaving
/// it to the session store to apply them.
#[derive(Clone)]
pub struct ExpressionEvaluator {
    engine: Arc<dyn MathEngine>,
}

impl std::fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionEvaluator")
            .field("engine", &"<dyn MathEngine>")
            .finish()
    }
}

impl ExpressionEvaluator {
    pub fn new(engine: Arc<dyn MathEngine>) -> Self {
        Self { engine }
    }

    /// Evaluates `raw_input` against `scope`.
    ///
    /// If the input lacks a leading operand (`+5`, `*2`, `-1`), it is treated as
    /// a continuation of the previous answer and evaluated as `ans+5` etc.
    pub fn evaluate(&self, raw_input: &str, scope: &Scope) -> EvaluationResult {
        let input = raw_input.trim();

        let node = match self.parse_with_operand_inference(input) {
            Ok(node) => node,
            Err(err) => {
                tracing::debug!("[Evaluator] Parse failed for '{}': {}", input, err);
                return EvaluationResult::failure(input, err.to_string());
            }
        };

        let mut working = scope.clone();
        match node.evaluate(&mut working) {
            Ok(value) => EvaluationResult::success(
                input,
                node.text_form(),
                node.typeset_form(),
                value,
            )
            .with_assignments(working.changed_since(scope)),
            Err(err) => {
                tracing::debug!("[Evaluator] Evaluation failed for '{}': {}", input, err);
                EvaluationResult::failure(input, err.to_string())
            }
        }
    }

    fn parse_with_operand_inference(
        &self,
        input: &str,
    ) -> Result<Box<dyn ParsedNode>, ParseError> {
        match self.engine.parse(input) {
            Ok(node) if node.is_unary_sign() => match self.parse_continuation(input) {
                Ok(continued) => Ok(continued),
                Err(_) => Ok(node),
            },
            Ok(node) => Ok(node),
            Err(err) if err.is_missing_leading_operand() => {
                self.parse_continuation(input).map_err(|_| err)
            }
            Err(err) => Err(err),
        }
    }

    fn parse_continuation(&self, input: &str) -> Result<Box<dyn ParsedNode>, ParseError> {
        tracing::debug!("[Evaluator] Inferring '{}' as left operand of '{}'", ANS, input);
        self.engine.parse(&format!("{}{}", ANS, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EvalError;
    use crate::value::Value;

    /// Engine understanding `<n>`, `+<n>`, `ans+<n>`, `x=<n>` and `fail`.
    struct ScriptedEngine;

    #[derive(Debug)]
    enum ScriptedNode {
        Number(f64),
        UnaryPlus(f64),
        AnsPlus(f64),
        Assign(String, f64),
        Fail,
    }

    impl ParsedNode for ScriptedNode {
        fn text_form(&self) -> String {
            match self {
                ScriptedNode::Number(n) => n.to_string(),
                ScriptedNode::UnaryPlus(n) => format!("+{}", n),
                ScriptedNode::AnsPlus(n) => format!("ans + {}", n),
                ScriptedNode::Assign(name, n) => format!("{} = {}", name, n),
                ScriptedNode::Fail => "fail".to_string(),
            }
        }

        fn typeset_form(&self) -> String {
            self.text_form()
        }

        fn is_unary_sign(&self) -> bool {
            matches!(self, ScriptedNode::UnaryPlus(_))
        }

        fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError> {
            match self {
                ScriptedNode::Number(n) | ScriptedNode::UnaryPlus(n) => Ok(Value::Number(*n)),
                ScriptedNode::AnsPlus(n) => {
                    let ans = scope
                        .ans()
                        .as_number()
                        .ok_or_else(|| EvalError::NotANumber("ans".to_string()))?;
                    Ok(Value::Number(ans + n))
                }
                ScriptedNode::Assign(name, n) => {
                    scope.set(name.clone(), Value::Number(*n));
                    Ok(Value::Number(*n))
                }
                ScriptedNode::Fail => {
                    scope.set("partial", Value::Number(1.0));
                    Err(EvalError::Domain("scripted failure".to_string()))
                }
            }
        }
    }

    impl MathEngine for ScriptedEngine {
        fn parse(&self, text: &str) -> Result<Box<dyn ParsedNode>, ParseError> {
            let number = |s: &str| {
                s.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    literal: s.to_string(),
                    position: 1,
                })
            };

            if text == "fail" {
                Ok(Box::new(ScriptedNode::Fail))
            } else if let Some(rest) = text.strip_prefix("ans+") {
                Ok(Box::new(ScriptedNode::AnsPlus(number(rest)?)))
            } else if let Some(rest) = text.strip_prefix("x=") {
                Ok(Box::new(ScriptedNode::Assign("x".to_string(), number(rest)?)))
            } else if let Some(rest) = text.strip_prefix('+') {
                Ok(Box::new(ScriptedNode::UnaryPlus(number(rest)?)))
            } else if text.starts_with('*') || text.starts_with("ans*") {
                Err(ParseError::MissingOperand {
                    position: if text.starts_with('*') { 1 } else { 5 },
                })
            } else {
                Ok(Box::new(ScriptedNode::Number(number(text)?)))
            }
        }
    }

    fn evaluator() -> ExpressionEvaluator {
        ExpressionEvaluator::new(Arc::new(ScriptedEngine))
    }

    fn scope_with_ans(ans: f64) -> Scope {
        let mut scope = Scope::new();
        scope.set_ans(Value::Number(ans));
        scope
    }

    #[test]
    fn test_unary_sign_is_continued_from_ans() {
        let result = evaluator().evaluate("+5", &scope_with_ans(3.0));
        assert!(result.succeeded());
        assert_eq!(result.result(), Some(&Value::Number(8.0)));
        assert_eq!(result.original(), "+5");
        assert_eq!(result.normalized_expression(), "ans + 5");
    }

    #[test]
    fn test_missing_operand_with_failed_retry_reports_original_error() {
        let result = evaluator().evaluate("*", &scope_with_ans(3.0));
        assert!(!result.succeeded());
        assert_eq!(result.error_message(), Some("Value expected (char 1)"));
        assert!(result.normalized_expression().is_empty());
    }

    #[test]
    fn test_unrelated_parse_error_is_not_retried() {
        let result = evaluator().evaluate("abc", &Scope::new());
        assert_eq!(result.error_message(), Some("Invalid number 'abc' (char 1)"));
    }

    #[test]
    fn test_scope_is_not_mutated_on_failure() {
        let scope = scope_with_ans(2.0);
        let result = evaluator().evaluate("fail", &scope);
        assert!(!result.succeeded());
        assert!(scope.get("partial").is_none());
        assert!(result.assignments().is_empty());
    }

    #[test]
    fn test_assignment_is_reported_not_applied() {
        let scope = Scope::new();
        let result = evaluator().evaluate("x=4", &scope);
        assert!(result.succeeded());
        assert_eq!(result.assignments().get("x"), Some(&Value::Number(4.0)));
        assert!(scope.get("x").is_none());
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let scope = scope_with_ans(10.0);
        let first = evaluator().evaluate("+1.5", &scope);
        let second = evaluator().evaluate("+1.5", &scope);
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_is_trimmed() {
        let result = evaluator().evaluate("  7 ", &Scope::new());
        assert_eq!(result.original(), "7");
        assert_eq!(result.result(), Some(&Value::Number(7.0)));
    }
}
