//! Math engine capability.
//!
//! The evaluator depends on these traits only. `tabcalc-engine` provides the
//! implementation used by the application; tests may plug in their own.

use crate::value::{Scope, Value};
use std::fmt;
use thiserror::Error;

/// Diagnostic produced when an expression cannot be parsed.
///
/// Positions are 1-based character indices into the parsed text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A value was expected but an operator (or nothing) was found.
    #[error("Value expected (char {position})")]
    MissingOperand { position: usize },

    #[error("Unexpected token '{found}' (char {position})")]
    UnexpectedToken { found: String, position: usize },

    #[error("Unexpected end of expression (char {position})")]
    UnexpectedEnd { position: usize },

    #[error("Parenthesis ) expected (char {position})")]
    UnclosedParenthesis { position: usize },

    #[error("Invalid number '{literal}' (char {position})")]
    InvalidNumber { literal: String, position: usize },

    #[error("Invalid left hand side of assignment (char {position})")]
    InvalidAssignment { position: usize },

    /// Parentheses, operator chains or signs nest beyond the supported depth.
    #[error("Expression nested too deeply (char {position})")]
    TooDeep { position: usize },

    #[error("Empty expression")]
    Empty,
}

impl ParseError {
    /// True when the expression starts with an operator that needs a left operand,
    /// e.g. `*2`.
    pub fn is_missing_leading_operand(&self) -> bool {
        matches!(self, ParseError::MissingOperand { position: 1 })
    }
}

/// Error raised while evaluating a parsed expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Undefined symbol {0}")]
    UndefinedSymbol(String),

    #[error("Undefined function {0}")]
    UndefinedFunction(String),

    #[error("Wrong number of arguments in function {name} ({found} provided, {expected} expected)")]
    WrongArity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("Value of {0} is not a number")]
    NotANumber(String),

    #[error("Cannot assign to constant {0}")]
    ConstantAssignment(String),

    #[error("{0}")]
    Domain(String),
}

/// A parsed expression.
pub trait ParsedNode: fmt::Debug + Send + Sync {
    /// Canonical textual form, e.g. `ans + 5`.
    fn text_form(&self) -> String;

    /// TeX form suitable for the typesetting capability.
    fn typeset_form(&self) -> String;

    /// True if the top-level node is a unary plus or minus.
    fn is_unary_sign(&self) -> bool;

    /// Evaluates the expression. Assignments write into `scope`.
    fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError>;
}

/// Parses expression text into evaluable nodes.
pub trait MathEngine: Send + Sync {
    fn parse(&self, text: &str) -> Result<Box<dyn ParsedNode>, ParseError>;
}
