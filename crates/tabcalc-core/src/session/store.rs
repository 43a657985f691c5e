//! Session store: the ordered tab collection.

use super::model::{DEFAULT_LABEL_HINT, Session};
use super::persister::StorePersister;
use crate::error::{CalcError, Result};
use crate::evaluation::EvaluationResult;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Ordered collection of sessions plus the index of the active one.
///
/// Invariants: the session list is never empty and `active_index < len`.
///
/// Every mutator schedules a persist through the attached [`StorePersister`]
/// (if any). A store without a persister is purely in-memory.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Vec<Session>,
    active_index: usize,
    persister: Option<Arc<dyn StorePersister>>,
}

impl SessionStore {
    /// Creates the fresh default store: one empty session labelled "Tab 1".
    pub fn default_store() -> Self {
        Self {
            sessions: vec![Session::default()],
            active_index: 0,
            persister: None,
        }
    }

    /// Builds a store from decoded parts, repairing broken invariants.
    ///
    /// An empty list becomes the default store; an out-of-range index is clamped.
    pub fn from_parts(sessions: Vec<Session>, active_index: usize) -> Self {
        if sessions.is_empty() {
            tracing::warn!("[SessionStore] No sessions in decoded data, using default store");
            return Self::default_store();
        }

        let last = sessions.len() - 1;
        if active_index > last {
            tracing::warn!(
                "[SessionStore] Active index {} out of range ({} sessions), clamping to {}",
                active_index,
                sessions.len(),
                last
            );
        }

        Self {
            active_index: active_index.min(last),
            sessions,
            persister: None,
        }
    }

    /// Attaches the persister used by all subsequent mutations.
    pub fn attach_persister(&mut self, persister: Arc<dyn StorePersister>) {
        self.persister = Some(persister);
    }

    pub fn has_persister(&self) -> bool {
        self.persister.is_some()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, index: usize) -> Option<&Session> {
        self.sessions.get(index)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_session(&self) -> &Session {
        &self.sessions[self.active_index]
    }

    // ============================================================================
    // Mutators
    // ============================================================================

    /// Appends a new empty session and makes it active.
    ///
    /// The label is `"{hint} {n}"` with the smallest `n >= 1` not used by any
    /// existing label. Returns the index of the new session.
    pub fn create_session(&mut self, label_hint: &str) -> usize {
        let hint = match label_hint.trim() {
            "" => DEFAULT_LABEL_HINT,
            hint => hint,
        };
        let label = self.next_free_label(hint);

        self.sessions.push(Session::new(label));
        self.active_index = self.sessions.len() - 1;
        tracing::debug!(
            "[SessionStore] Created session '{}' at index {}",
            self.sessions[self.active_index].label,
            self.active_index
        );

        self.schedule_persist();
        self.active_index
    }

    /// Removes the session at `index`.
    ///
    /// The last remaining session is never removed; it is reset to the fresh
    /// default instead. The active index keeps its numeric value and is only
    /// clamped when it falls past the new last session.
    pub fn delete_session(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;

        if self.sessions.len() == 1 {
            self.sessions[0].reset();
            self.active_index = 0;
        } else {
            self.sessions.remove(index);
            self.active_index = self.active_index.min(self.sessions.len() - 1);
        }
        tracing::debug!(
            "[SessionStore] Deleted session {} (active: {})",
            index,
            self.active_index
        );

        self.schedule_persist();
        Ok(())
    }

    /// Changes a session's label. Labels need not be unique.
    pub fn rename_session(&mut self, index: usize, label: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        self.sessions[index].label = label.into();
        self.schedule_persist();
        Ok(())
    }

    /// Switches the active session.
    pub fn set_active(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.active_index = index;
        self.schedule_persist();
        Ok(())
    }

    /// Appends an evaluation to the active session.
    ///
    /// Successful results update `ans` and apply their assignments; failures
    /// only add a history entry.
    pub fn record_evaluation(&mut self, result: EvaluationResult) {
        self.sessions[self.active_index].record(result);
        self.schedule_persist();
    }

    /// Empties the active session's history. The scope is kept.
    pub fn clear_active_history(&mut self) {
        self.sessions[self.active_index].history.clear();
        self.schedule_persist();
    }

    /// Writes the store synchronously through the attached persister.
    pub fn persist_now(&self) -> Result<()> {
        match &self.persister {
            Some(persister) => persister.persist_now(self),
            None => Ok(()),
        }
    }

    fn schedule_persist(&self) {
        if let Some(persister) = &self.persister {
            persister.schedule(self);
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.sessions.len() {
            Ok(())
        } else {
            Err(CalcError::invalid_index(index, self.sessions.len()))
        }
    }

    fn next_free_label(&self, hint: &str) -> String {
        let used: HashSet<&str> = self.sessions.iter().map(|s| s.label.as_str()).collect();
        (1..)
            .map(|n| format!("{} {}", hint, n))
            .find(|label| !used.contains(label.as_str()))
            .unwrap_or_else(|| hint.to_string())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::default_store()
    }
}

impl PartialEq for SessionStore {
    fn eq(&self, other: &Self) -> bool {
        self.active_index == other.active_index && self.sessions == other.sessions
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions)
            .field("active_index", &self.active_index)
            .field("persister", &self.persister.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DEFAULT_SESSION_LABEL;
    use crate::value::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPersister {
        scheduled: Mutex<Vec<SessionStore>>,
    }

    impl RecordingPersister {
        fn count(&self) -> usize {
            self.scheduled.lock().unwrap().len()
        }

        fn last(&self) -> Option<SessionStore> {
            self.scheduled.lock().unwrap().last().cloned()
        }
    }

    impl StorePersister for RecordingPersister {
        fn schedule(&self, store: &SessionStore) {
            self.scheduled.lock().unwrap().push(store.clone());
        }

        fn persist_now(&self, store: &SessionStore) -> Result<()> {
            self.schedule(store);
            Ok(())
        }
    }

    fn labels(store: &SessionStore) -> Vec<&str> {
        store.sessions().iter().map(|s| s.label.as_str()).collect()
    }

    fn success(input: &str, value: f64) -> EvaluationResult {
        EvaluationResult::success(input, input, input, Value::Number(value))
    }

    #[test]
    fn test_default_store() {
        let store = SessionStore::default_store();
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_index(), 0);
        assert_eq!(store.active_session().label, DEFAULT_SESSION_LABEL);
        assert!(store.active_session().history.is_empty());
        assert_eq!(store.active_session().scope.ans(), &Value::Number(0.0));
    }

    #[test]
    fn test_create_session_picks_distinct_labels() {
        let mut store = SessionStore::default_store();
        let first = store.create_session("Tab");
        let second = store.create_session("Tab");

        assert_eq!(labels(&store), vec!["Tab 1", "Tab 2", "Tab 3"]);
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.active_index(), 2);
    }

    #[test]
    fn test_create_session_fills_gaps_and_defaults_hint() {
        let mut store = SessionStore::default_store();
        store.create_session("Tab");
        store.create_session("Tab");
        store.delete_session(1).unwrap();
        store.create_session("  ");

        assert_eq!(labels(&store), vec!["Tab 1", "Tab 3", "Tab 2"]);
    }

    #[test]
    fn test_delete_last_session_resets_it() {
        let mut store = SessionStore::default_store();
        store.rename_session(0, "Work").unwrap();
        store.record_evaluation(success("2", 2.0));

        store.delete_session(0).unwrap();

        assert_eq!(store, SessionStore::default_store());
    }

    #[test]
    fn test_delete_before_active_keeps_active_index() {
        let mut store = SessionStore::default_store();
        store.create_session("Tab");
        store.create_session("Tab");
        store.create_session("Tab");
        store.set_active(2).unwrap();
        assert_eq!(store.active_session().label, "Tab 3");

        store.delete_session(0).unwrap();

        assert_eq!(store.active_index(), 2);
        assert_eq!(store.active_session().label, "Tab 4");
    }

    #[test]
    fn test_delete_before_active_clamps_when_active_was_last() {
        let mut store = SessionStore::default_store();
        store.create_session("Tab");
        store.create_session("Tab");

        store.delete_session(0).unwrap();

        assert_eq!(store.active_index(), 1);
        assert_eq!(store.active_session().label, "Tab 3");
    }

    #[test]
    fn test_delete_active_selects_successor_or_new_last() {
        let mut store = SessionStore::default_store();
        store.create_session("Tab");
        store.create_session("Tab");

        store.set_active(1).unwrap();
        store.delete_session(1).unwrap();
        assert_eq!(store.active_session().label, "Tab 3");

        store.delete_session(1).unwrap();
        assert_eq!(store.active_index(), 0);
        assert_eq!(store.active_session().label, "Tab 1");
    }

    #[test]
    fn test_invalid_index_is_rejected() {
        let mut store = SessionStore::default_store();

        assert_eq!(
            store.set_active(3),
            Err(CalcError::InvalidIndex { index: 3, len: 1 })
        );
        assert!(store.delete_session(1).unwrap_err().is_invalid_index());
        assert!(store.rename_session(5, "x").unwrap_err().is_invalid_index());
        assert_eq!(store, SessionStore::default_store());
    }

    #[test]
    fn test_ans_tracks_successes_only() {
        let mut store = SessionStore::default_store();
        store.record_evaluation(success("3", 3.0));
        store.record_evaluation(EvaluationResult::failure("*", "Value expected (char 1)"));

        let session = store.active_session();
        assert_eq!(session.scope.ans(), &Value::Number(3.0));
        assert_eq!(session.history.len(), 2);
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut store = SessionStore::default_store();
        store.record_evaluation(success("7", 7.0));
        store.create_session("Tab");
        store.record_evaluation(success("1", 1.0));

        assert_eq!(store.sessions()[0].scope.ans(), &Value::Number(7.0));
        assert_eq!(store.sessions()[1].scope.ans(), &Value::Number(1.0));
        assert_eq!(store.sessions()[0].history.len(), 1);
    }

    #[test]
    fn test_clear_active_history_keeps_scope() {
        let mut store = SessionStore::default_store();
        store.record_evaluation(success("5", 5.0));
        store.clear_active_history();

        assert!(store.active_session().history.is_empty());
        assert_eq!(store.active_session().scope.ans(), &Value::Number(5.0));
    }

    #[test]
    fn test_from_parts_repairs_invariants() {
        assert_eq!(
            SessionStore::from_parts(Vec::new(), 4),
            SessionStore::default_store()
        );

        let store = SessionStore::from_parts(vec![Session::new("a"), Session::new("b")], 9);
        assert_eq!(store.active_index(), 1);
    }

    #[test]
    fn test_every_mutation_schedules_persist() {
        let persister = Arc::new(RecordingPersister::default());
        let mut store = SessionStore::default_store();
        store.attach_persister(persister.clone());

        store.create_session("Tab");
        store.rename_session(1, "Scratch").unwrap();
        store.set_active(0).unwrap();
        store.record_evaluation(success("1", 1.0));
        store.clear_active_history();
        store.delete_session(1).unwrap();
        assert_eq!(persister.count(), 6);

        // Rejected calls change nothing and schedule nothing.
        let _ = store.set_active(10);
        assert_eq!(persister.count(), 6);

        assert_eq!(persister.last(), Some(store.clone()));
    }

    #[test]
    fn test_persist_now_without_persister_is_noop() {
        let store = SessionStore::default_store();
        assert!(store.persist_now().is_ok());
        assert!(!store.has_persister());
    }
}
