//! Pratt parser producing [`Expr`] trees.
//!
//! Binding powers, loosest first:
//!
//! | operator        | left | right |
//! |-----------------|------|-------|
//! | `=`             | 2    | 1     |
//! | `+ -`           | 3    | 4     |
//! | `* / %`         | 5    | 6     |
//! | prefix `+ -`    |      | 7     |
//! | `^`             | 10   | 9     |
//! | postfix `!`     | 11   |       |

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::lexer::{Token, TokenKind, tokenize};
use tabcalc_core::engine::ParseError;

const ASSIGN_BP: (u8, u8) = (2, 1);
const PREFIX_BP: u8 = 7;
const POSTFIX_BP: u8 = 11;

/// Deepest expression tree the parser accepts.
///
/// Printing and evaluation walk the tree recursively, so the bound applies to
/// chains built iteratively (`1+1+...`, `3!!!`) as well as to nested groups.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parses a complete expression.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end_position: text.chars().count() + 1,
        recursion: 0,
    };
    let (expr, _) = parser.parse_expr(0)?;

    match parser.peek() {
        Some(token) => Err(ParseError::UnexpectedToken {
            found: token.kind.lexeme(),
            position: token.position,
        }),
        None => Ok(expr),
    }
}

/// An expression together with the depth of its tree.
type Parsed = (Expr, usize);

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Position reported for errors at the end of input.
    end_position: usize,
    /// Current `parse_expr` nesting.
    recursion: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn current_position(&self) -> usize {
        self.peek()
            .map(|token| token.position)
            .unwrap_or(self.end_position)
    }

    /// Depth of a node whose deepest child has depth `child_depth`.
    fn node_depth(&self, child_depth: usize, position: usize) -> Result<usize, ParseError> {
        let depth = child_depth + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeep { position });
        }
        Ok(depth)
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Parsed, ParseError> {
        if self.recursion >= MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeep {
                position: self.current_position(),
            });
        }
        self.recursion += 1;
        let parsed = self.parse_expr_at_depth(min_bp);
        self.recursion -= 1;
        parsed
    }

    fn parse_expr_at_depth(&mut self, min_bp: u8) -> Result<Parsed, ParseError> {
        let (mut lhs, mut depth) = self.parse_prefix()?;

        while let Some(token) = self.peek().cloned() {
            match token.kind {
                TokenKind::Bang => {
                    if POSTFIX_BP < min_bp {
                        break;
                    }
                    self.advance();
                    depth = self.node_depth(depth, token.position)?;
                    lhs = Expr::Factorial(Box::new(lhs));
                }
                TokenKind::Equals => {
                    let (left_bp, right_bp) = ASSIGN_BP;
                    if left_bp < min_bp {
                        break;
                    }
                    self.advance();
                    let name = match lhs {
                        Expr::Symbol(name) => name,
                        _ => {
                            return Err(ParseError::InvalidAssignment {
                                position: token.position,
                            });
                        }
                    };
                    let (value, value_depth) = self.parse_expr(right_bp)?;
                    depth = self.node_depth(value_depth, token.position)?;
                    lhs = Expr::Assign {
                        name,
                        value: Box::new(value),
                    };
                }
                ref kind => {
                    let Some((op, left_bp, right_bp)) = infix_binding_power(kind) else {
                        break;
                    };
                    if left_bp < min_bp {
                        break;
                    }
                    self.advance();
                    let (rhs, rhs_depth) = self.parse_expr(right_bp)?;
                    depth = self.node_depth(depth.max(rhs_depth), token.position)?;
                    lhs = Expr::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
            }
        }

        Ok((lhs, depth))
    }

    fn parse_prefix(&mut self) -> Result<Parsed, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                position: self.end_position,
            });
        };

        match token.kind {
            TokenKind::Number { value, literal } => Ok((Expr::Number { value, literal }, 1)),
            TokenKind::Ident(name) => {
                if matches!(self.peek(), Some(Token { kind: TokenKind::LParen, .. })) {
                    self.advance();
                    let (args, args_depth) = self.parse_arguments()?;
                    let depth = self.node_depth(args_depth, token.position)?;
                    Ok((Expr::Call { name, args }, depth))
                } else {
                    Ok((Expr::Symbol(name), 1))
                }
            }
            TokenKind::LParen => {
                let (inner, inner_depth) = self.parse_expr(0)?;
                self.expect_closing()?;
                let depth = self.node_depth(inner_depth, token.position)?;
                Ok((Expr::Group(Box::new(inner)), depth))
            }
            TokenKind::Minus => self.parse_unary(UnaryOp::Minus, token.position),
            TokenKind::Plus => self.parse_unary(UnaryOp::Plus, token.position),
            _ => Err(ParseError::MissingOperand {
                position: token.position,
            }),
        }
    }

    fn parse_unary(&mut self, op: UnaryOp, position: usize) -> Result<Parsed, ParseError> {
        let (operand, operand_depth) = self.parse_expr(PREFIX_BP)?;
        let depth = self.node_depth(operand_depth, position)?;
        Ok((
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            depth,
        ))
    }

    /// Parses `a, b, c)` after an opening parenthesis of a call.
    ///
    /// Also returns the depth of the deepest argument.
    fn parse_arguments(&mut self) -> Result<(Vec<Expr>, usize), ParseError> {
        let mut args = Vec::new();
        let mut depth = 0;
        if matches!(self.peek(), Some(Token { kind: TokenKind::RParen, .. })) {
            self.advance();
            return Ok((args, depth));
        }

        loop {
            let (arg, arg_depth) = self.parse_expr(0)?;
            args.push(arg);
            depth = depth.max(arg_depth);
            match self.peek().map(|token| &token.kind) {
                Some(TokenKind::Comma) => {
                    self.advance();
                }
                Some(TokenKind::RParen) => {
                    self.advance();
                    return Ok((args, depth));
                }
                _ => {
                    return Err(ParseError::UnclosedParenthesis {
                        position: self.current_position(),
                    });
                }
            }
        }
    }

    fn expect_closing(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => {
                self.advance();
                Ok(())
            }
            _ => Err(ParseError::UnclosedParenthesis {
                position: self.current_position(),
            }),
        }
    }
}

fn infix_binding_power(kind: &TokenKind) -> Option<(BinaryOp, u8, u8)> {
    let entry = match kind {
        TokenKind::Plus => (BinaryOp::Add, 3, 4),
        TokenKind::Minus => (BinaryOp::Subtract, 3, 4),
        TokenKind::Star => (BinaryOp::Multiply, 5, 6),
        TokenKind::Slash => (BinaryOp::Divide, 5, 6),
        TokenKind::Percent => (BinaryOp::Modulo, 5, 6),
        TokenKind::Caret => (BinaryOp::Power, 10, 9),
        _ => return None,
    };
    Some(entry)
}
