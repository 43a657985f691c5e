//! Expression tree and its textual forms.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "^",
        }
    }
}

/// Parsed expression. Parentheses from the input are kept as [`Expr::Group`]
/// so the canonical text reproduces them.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number { value: f64, literal: String },
    Symbol(String),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Factorial(Box<Expr>),
    Call { name: String, args: Vec<Expr> },
    Group(Box<Expr>),
    Assign { name: String, value: Box<Expr> },
}

impl Expr {
    /// Canonical spaced form, e.g. `ans + 5`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// TeX rendering of the expression.
    pub fn to_tex(&self) -> String {
        match self {
            Expr::Number { literal, .. } => number_tex(literal),
            Expr::Symbol(name) => symbol_tex(name),
            Expr::Unary { op, operand } => format!("{}{}", op.symbol(), operand.to_tex()),
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::Add => format!("{}+{}", lhs.to_tex(), rhs.to_tex()),
                BinaryOp::Subtract => format!("{}-{}", lhs.to_tex(), rhs.to_tex()),
                BinaryOp::Multiply => format!("{}\\cdot{}", lhs.to_tex(), rhs.to_tex()),
                BinaryOp::Divide => format!(
                    "\\frac{{{}}}{{{}}}",
                    lhs.without_group().to_tex(),
                    rhs.without_group().to_tex()
                ),
                BinaryOp::Modulo => format!("{}\\bmod{}", lhs.to_tex(), rhs.to_tex()),
                BinaryOp::Power => format!(
                    "{{{}}}^{{{}}}",
                    lhs.to_tex(),
                    rhs.without_group().to_tex()
                ),
            },
            Expr::Factorial(operand) => format!("{}!", operand.to_tex()),
            Expr::Call { name, args } => call_tex(name, args),
            Expr::Group(inner) => format!("\\left({}\\right)", inner.to_tex()),
            Expr::Assign { name, value } => format!("{}:={}", symbol_tex(name), value.to_tex()),
        }
    }

    fn without_group(&self) -> &Expr {
        match self {
            Expr::Group(inner) => inner.without_group(),
            other => other,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number { literal, .. } => f.write_str(literal),
            Expr::Symbol(name) => f.write_str(name),
            Expr::Unary { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Expr::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Expr::Factorial(operand) => write!(f, "{}!", operand),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Group(inner) => write!(f, "({})", inner),
            Expr::Assign { name, value } => write!(f, "{} = {}", name, value),
        }
    }
}

fn number_tex(literal: &str) -> String {
    match literal.find(['e', 'E']) {
        Some(idx) => {
            let exponent = literal[idx + 1..].trim_start_matches('+');
            format!("{}\\cdot10^{{{}}}", &literal[..idx], exponent)
        }
        None => literal.to_string(),
    }
}

fn symbol_tex(name: &str) -> String {
    match name {
        "pi" => "\\pi".to_string(),
        "tau" => "\\tau".to_string(),
        "phi" => "\\phi".to_string(),
        _ if name.chars().count() == 1 => name.to_string(),
        _ => format!("\\mathrm{{{}}}", name),
    }
}

fn call_tex(name: &str, args: &[Expr]) -> String {
    match (name, args) {
        ("sqrt", [arg]) => format!("\\sqrt{{{}}}", arg.without_group().to_tex()),
        ("cbrt", [arg]) => format!("\\sqrt[3]{{{}}}", arg.without_group().to_tex()),
        ("abs", [arg]) => format!("\\left|{}\\right|", arg.without_group().to_tex()),
        _ => {
            let rendered: Vec<String> = args.iter().map(Expr::to_tex).collect();
            format!("\\mathrm{{{}}}\\left({}\\right)", name, rendered.join(","))
        }
    }
}
