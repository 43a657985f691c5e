//! Tokenizer for calculator expressions.

use tabcalc_core::engine::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number { value: f64, literal: String },
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Bang,
    Equals,
    Comma,
    LParen,
    RParen,
}

impl TokenKind {
    /// Source text of the token, used in diagnostics.
    pub fn lexeme(&self) -> String {
        match self {
            TokenKind::Number { literal, .. } => literal.clone(),
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::Caret => "^".to_string(),
            TokenKind::Percent => "%".to_string(),
            TokenKind::Bang => "!".to_string(),
            TokenKind::Equals => "=".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
        }
    }
}

/// A token with its 1-based character position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Splits `text` into tokens. Whitespace is skipped.
pub fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let position = i + 1;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let (kind, next) = lex_number(&chars, i)?;
            tokens.push(Token { kind, position });
            i = next;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            tokens.push(Token {
                kind: TokenKind::Ident(name),
                position,
            });
            continue;
        }

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '%' => TokenKind::Percent,
            '!' => TokenKind::Bang,
            '=' => TokenKind::Equals,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            other => {
                return Err(ParseError::UnexpectedToken {
                    found: other.to_string(),
                    position,
                });
            }
        };
        tokens.push(Token { kind, position });
        i += 1;
    }

    Ok(tokens)
}

/// Lexes `12`, `3.5`, `.5`, `1e3`, `2.5E-4`. Returns the token and the index after it.
fn lex_number(chars: &[char], start: usize) -> Result<(TokenKind, usize), ParseError> {
    let mut i = start;
    let mut seen_dot = false;

    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        if chars[i] == '.' {
            if seen_dot {
                // consume the rest so the diagnostic shows the whole literal
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                return Err(invalid_number(chars, start, i));
            }
            seen_dot = true;
        }
        i += 1;
    }

    // Exponent only when digits follow, so `2e` stays a number followed by `e`.
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    let literal: String = chars[start..i].iter().collect();
    match literal.parse::<f64>() {
        Ok(value) => Ok((TokenKind::Number { value, literal }, i)),
        Err(_) => Err(invalid_number(chars, start, i)),
    }
}

fn invalid_number(chars: &[char], start: usize, end: usize) -> ParseError {
    ParseError::InvalidNumber {
        literal: chars[start..end].iter().collect(),
        position: start + 1,
    }
}
