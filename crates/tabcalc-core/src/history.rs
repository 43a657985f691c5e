//! Session history and recall navigation.

use crate::evaluation::EvaluationResult;

/// Chronological, append-only log of evaluations for one session.
///
/// Entries are only ever removed all at once via [`HistoryLog::clear`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLog {
    entries: Vec<EvaluationResult>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: EvaluationResult) {
        self.entries.push(entry);
    }

    pub fn get(&self, index: usize) -> Option<&EvaluationResult> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&EvaluationResult> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[EvaluationResult] {
        &self.entries
    }

    /// Replaces the log with an empty one.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<EvaluationResult>> for HistoryLog {
    fn from(entries: Vec<EvaluationResult>) -> Self {
        Self { entries }
    }
}

impl FromIterator<EvaluationResult> for HistoryLog {
    fn from_iter<I: IntoIterator<Item = EvaluationResult>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Recall position over a [`HistoryLog`] (up/down arrow navigation).
///
/// The position is always within `[0, len]`, where `len` stands for the new,
/// still empty input line. This is ephemeral UI state and is never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCursor {
    position: usize,
    len: usize,
}

impl HistoryCursor {
    /// Creates a cursor positioned on the empty line after `len` entries.
    pub fn at_end(len: usize) -> Self {
        Self { position: len, len }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position == self.len
    }

    /// Moves back to the end of a log that now holds `len` entries.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.position = len;
    }

    /// Steps towards older entries, stopping at the first one.
    pub fn previous(&mut self) -> usize {
        self.position = self.position.saturating_sub(1);
        self.position
    }

    /// Steps towards newer entries, stopping at the empty line.
    pub fn next(&mut self) -> usize {
        self.position = (self.position + 1).min(self.len);
        self.position
    }

    /// Input text for the current position: the entry's original input, or
    /// empty on the new line.
    pub fn recall<'a>(&self, history: &'a HistoryLog) -> &'a str {
        history
            .get(self.position)
            .map(EvaluationResult::recall_text)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn log_of(inputs: &[&str]) -> HistoryLog {
        inputs
            .iter()
            .map(|input| EvaluationResult::success(*input, *input, *input, Value::Number(1.0)))
            .collect()
    }

    #[test]
    fn test_push_preserves_order() {
        let mut log = HistoryLog::new();
        log.push(EvaluationResult::failure("a", "e"));
        log.push(EvaluationResult::failure("b", "e"));

        let originals: Vec<&str> = log.iter().map(|e| e.original()).collect();
        assert_eq!(originals, vec!["a", "b"]);
        assert_eq!(log.last().map(|e| e.original()), Some("b"));
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = log_of(&["1", "2"]);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_cursor_never_leaves_range() {
        let log = log_of(&["1+1", "2*3", "4^2"]);
        let mut cursor = HistoryCursor::at_end(log.len());

        for _ in 0..10 {
            cursor.previous();
        }
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.recall(&log), "1+1");

        for _ in 0..10 {
            cursor.next();
        }
        assert_eq!(cursor.position(), log.len());
        assert!(cursor.is_at_end());
        assert_eq!(cursor.recall(&log), "");
    }

    #[test]
    fn test_cursor_on_empty_log() {
        let log = HistoryLog::new();
        let mut cursor = HistoryCursor::at_end(0);

        assert_eq!(cursor.previous(), 0);
        assert_eq!(cursor.next(), 0);
        assert_eq!(cursor.recall(&log), "");
    }

    #[test]
    fn test_cursor_walks_back_and_forth() {
        let log = log_of(&["a", "b", "c"]);
        let mut cursor = HistoryCursor::at_end(log.len());

        cursor.previous();
        assert_eq!(cursor.recall(&log), "c");
        cursor.previous();
        assert_eq!(cursor.recall(&log), "b");
        cursor.next();
        assert_eq!(cursor.recall(&log), "c");

        cursor.reset(4);
        assert_eq!(cursor.position(), 4);
    }
}
