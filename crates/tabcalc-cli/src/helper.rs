//! Line editing support: completion, hints and highlighting.

use crate::commands::COMMAND_NAMES;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow::{self, Borrowed, Owned};
use tabcalc_engine::eval::{CONSTANTS, FUNCTIONS};

/// rustyline helper for the calculator prompt.
///
/// On `:` lines it completes command names. Elsewhere it completes the
/// identifier under the cursor from the built-in functions and constants and
/// the active tab's variables.
#[derive(Clone)]
pub struct CalcHelper {
    commands: Vec<String>,
    /// Functions (with their opening parenthesis) and constants.
    builtins: Vec<String>,
    variables: Vec<String>,
}

impl CalcHelper {
    pub fn new() -> Self {
        let mut builtins: Vec<String> = FUNCTIONS.iter().map(|name| format!("{}(", name)).collect();
        builtins.extend(CONSTANTS.iter().map(|(name, _)| name.to_string()));

        Self {
            commands: COMMAND_NAMES.iter().map(|name| name.to_string()).collect(),
            builtins,
            variables: Vec::new(),
        }
    }

    /// Replaces the variable names offered for completion.
    pub fn set_variables<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) {
        self.variables = names.into_iter().cloned().collect();
    }

    /// Returns where the word before `pos` starts and the names that extend it.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let before = &line[..pos];

        if before.starts_with(':') {
            if before.contains(char::is_whitespace) {
                return (pos, Vec::new());
            }
            let matches = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(before))
                .cloned()
                .collect();
            return (0, matches);
        }

        let start = identifier_start(before);
        let word = &before[start..];
        if word.is_empty() {
            return (pos, Vec::new());
        }

        let mut matches: Vec<String> = self
            .variables
            .iter()
            .chain(&self.builtins)
            .filter(|name| name.starts_with(word))
            .cloned()
            .collect();
        matches.sort();
        matches.dedup();
        (start, matches)
    }

    /// The text every candidate shares beyond what is already typed.
    fn hint_for(&self, line: &str, pos: usize) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let (start, matches) = self.candidates(line, pos);
        let typed = pos - start;
        let shared = common_prefix(&matches)?;
        (shared.len() > typed).then(|| shared[typed..].to_string())
    }
}

impl Default for CalcHelper {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset where the identifier ending at the end of `text` begins.
///
/// Leading digits are skipped, since `2pi` lexes as a number and a name.
fn identifier_start(text: &str) -> usize {
    let mut start = text.len();
    for (index, c) in text.char_indices().rev() {
        if c.is_alphanumeric() || c == '_' {
            start = index;
        } else {
            break;
        }
    }
    let digits = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    start + digits
}

fn common_prefix(names: &[String]) -> Option<&str> {
    let (first, rest) = names.split_first()?;
    let mut prefix = first.as_str();
    for name in rest {
        let shared: usize = prefix
            .chars()
            .zip(name.chars())
            .take_while(|(a, b)| a == b)
            .map(|(c, _)| c.len_utf8())
            .sum();
        prefix = &prefix[..shared];
    }
    Some(prefix)
}

impl Helper for CalcHelper {}

impl Completer for CalcHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(line, pos);
        let pairs = matches
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CalcHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with(':') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with(':')
    }
}

impl Hinter for CalcHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        self.hint_for(line, pos)
    }
}

impl Validator for CalcHelper {}
