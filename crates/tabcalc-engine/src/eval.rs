//! Evaluation of expression trees over `f64`.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use std::f64::consts;
use tabcalc_core::engine::EvalError;
use tabcalc_core::value::{Scope, Value};

/// Built-in constants. These names cannot be assigned.
pub const CONSTANTS: &[(&str, f64)] = &[
    ("pi", consts::PI),
    ("e", consts::E),
    ("tau", consts::TAU),
    ("phi", 1.618_033_988_749_895),
];

/// Built-in function names.
pub const FUNCTIONS: &[&str] = &[
    "sqrt", "cbrt", "abs", "sin", "cos", "tan", "asin", "acos", "atan", "ln", "log", "log10",
    "log2", "exp", "floor", "ceil", "round", "sign", "min", "max",
];

/// Largest `n` whose factorial is finite in `f64`.
const MAX_FACTORIAL: f64 = 170.0;

fn constant(name: &str) -> Option<f64> {
    CONSTANTS
        .iter()
        .find(|(constant, _)| *constant == name)
        .map(|(_, value)| *value)
}

impl Expr {
    /// Evaluates the expression. Assignments are written into `scope`.
    pub fn evaluate(&self, scope: &mut Scope) -> Result<f64, EvalError> {
        match self {
            Expr::Number { value, .. } => Ok(*value),
            Expr::Symbol(name) => lookup(name, scope),
            Expr::Unary { op, operand } => {
                let value = operand.evaluate(scope)?;
                Ok(match op {
                    UnaryOp::Plus => value,
                    UnaryOp::Minus => -value,
                })
            }
            Expr::Binary { op, lhs, rhs } => {
                let left = lhs.evaluate(scope)?;
                let right = rhs.evaluate(scope)?;
                Ok(apply_binary(*op, left, right))
            }
            Expr::Factorial(operand) => factorial(operand.evaluate(scope)?),
            Expr::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(scope))
                    .collect::<Result<Vec<f64>, EvalError>>()?;
                call(name, &values)
            }
            Expr::Group(inner) => inner.evaluate(scope),
            Expr::Assign { name, value } => {
                if constant(name).is_some() {
                    return Err(EvalError::ConstantAssignment(name.clone()));
                }
                let result = value.evaluate(scope)?;
                scope.set(name.clone(), Value::Number(result));
                Ok(result)
            }
        }
    }
}

fn lookup(name: &str, scope: &Scope) -> Result<f64, EvalError> {
    if let Some(value) = constant(name) {
        return Ok(value);
    }
    match scope.get(name) {
        Some(value) => value
            .as_number()
            .ok_or_else(|| EvalError::NotANumber(name.to_string())),
        None => Err(EvalError::UndefinedSymbol(name.to_string())),
    }
}

fn apply_binary(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Subtract => left - right,
        BinaryOp::Multiply => left * right,
        BinaryOp::Divide => left / right,
        // Floored modulo; the result takes the sign of the divisor.
        BinaryOp::Modulo => {
            if right == 0.0 {
                left
            } else {
                left - right * (left / right).floor()
            }
        }
        BinaryOp::Power => left.powf(right),
    }
}

fn factorial(n: f64) -> Result<f64, EvalError> {
    if n < 0.0 || n.fract() != 0.0 || n.is_nan() {
        return Err(EvalError::Domain(
            "Factorial requires a non-negative integer".to_string(),
        ));
    }
    if n > MAX_FACTORIAL {
        return Ok(f64::INFINITY);
    }
    Ok((2..=n as u64).fold(1.0, |acc, k| acc * k as f64))
}

fn call(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    let unary = |f: fn(f64) -> f64| -> Result<f64, EvalError> {
        match args {
            [x] => Ok(f(*x)),
            _ => Err(wrong_arity(name, "1", args.len())),
        }
    };

    match name {
        "sqrt" => unary(f64::sqrt),
        "cbrt" => unary(f64::cbrt),
        "abs" => unary(f64::abs),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "asin" => unary(f64::asin),
        "acos" => unary(f64::acos),
        "atan" => unary(f64::atan),
        "ln" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "log2" => unary(f64::log2),
        "exp" => unary(f64::exp),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "sign" => unary(|x| if x == 0.0 || x.is_nan() { x } else { x.signum() }),
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.ln() / base.ln()),
            _ => Err(wrong_arity(name, "1-2", args.len())),
        },
        "min" | "max" => {
            if args.is_empty() {
                return Err(wrong_arity(name, "1 or more", 0));
            }
            let pick: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
            Ok(args[1..].iter().fold(args[0], |acc, x| pick(acc, *x)))
        }
        _ => Err(EvalError::UndefinedFunction(name.to_string())),
    }
}

fn wrong_arity(name: &str, expected: &str, found: usize) -> EvalError {
    EvalError::WrongArity {
        name: name.to_string(),
        expected: expected.to_string(),
        found,
    }
}
