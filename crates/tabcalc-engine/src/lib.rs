//! Math engine for TabCalc.
//!
//! Implements the [`MathEngine`] and [`Typesetter`](tabcalc_core::typeset::Typesetter)
//! capabilities defined in `tabcalc-core`:
//!
//! - `lexer` / `parser`: text to [`ast::Expr`] (Pratt parser)
//! - `eval`: `f64` evaluation with constants and built-in functions
//! - `markup`: TeX to HTML-like markup

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod markup;
pub mod parser;

pub use markup::TexMarkupRenderer;

use ast::{Expr, UnaryOp};
use tabcalc_core::engine::{EvalError, MathEngine, ParseError, ParsedNode};
use tabcalc_core::value::{Scope, Value};

/// The default expression engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMathEngine;

impl BasicMathEngine {
    pub fn new() -> Self {
        Self
    }
}

impl MathEngine for BasicMathEngine {
    fn parse(&self, text: &str) -> Result<Box<dyn ParsedNode>, ParseError> {
        let expr = parser::parse(text)?;
        tracing::trace!("[Engine] Parsed '{}' as {:?}", text, expr);
        Ok(Box::new(ParsedExpression { expr }))
    }
}

/// An [`Expr`] exposed through the [`ParsedNode`] capability.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpression {
    expr: Expr,
}

impl ParsedExpression {
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl ParsedNode for ParsedExpression {
    fn text_form(&self) -> String {
        self.expr.to_text()
    }

    fn typeset_form(&self) -> String {
        self.expr.to_tex()
    }

    fn is_unary_sign(&self) -> bool {
        matches!(
            self.expr,
            Expr::Unary {
                op: UnaryOp::Plus | UnaryOp::Minus,
                ..
            }
        )
    }

    fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        self.expr.evaluate(scope).map(Value::Number)
    }
}
