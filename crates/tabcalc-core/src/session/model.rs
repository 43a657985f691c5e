//! Session domain model.

use crate::evaluation::EvaluationResult;
use crate::history::HistoryLog;
use crate::value::Scope;

/// Label of the session in a fresh store.
pub const DEFAULT_SESSION_LABEL: &str = "Tab 1";

/// Prefix used to label newly created sessions.
pub const DEFAULT_LABEL_HINT: &str = "Tab";

/// An independent calculation context (shown as a tab).
///
/// Each session owns its own history and variable scope; nothing is shared
/// between sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Display label. Not required to be unique.
    pub label: String,
    pub history: HistoryLog,
    pub scope: Scope,
}

impl Session {
    /// Creates an empty session with the given label and scope `{ans: 0}`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            history: HistoryLog::new(),
            scope: Scope::new(),
        }
    }

    /// Restores this session to the fresh default state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Appends an entry to the history and applies its effects to the scope.
    ///
    /// Only successful entries touch the scope: assignments first, then `ans`.
    pub fn record(&mut self, entry: EvaluationResult) {
        if let Some(value) = entry.result() {
            for (name, bound) in entry.assignments() {
                self.scope.set(name.clone(), bound.clone());
            }
            self.scope.set_ans(value.clone());
        }
        self.history.push(entry);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_LABEL)
    }
}
