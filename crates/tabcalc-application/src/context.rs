//! Calculator context: the explicitly constructed application root.
//!
//! `CalculatorContext::bootstrap` reads persisted state once, migrates it to
//! the current schema and wires the session store to a deferred persister.
//! Front ends hold one context and drive every operation through it.

use std::sync::Arc;
use tabcalc_core::error::{CalcError, Result};
use tabcalc_core::evaluation::EvaluationResult;
use tabcalc_core::evaluator::ExpressionEvaluator;
use tabcalc_core::history::HistoryCursor;
use tabcalc_core::session::{DEFAULT_LABEL_HINT, Session, SessionStore};
use tabcalc_core::storage::{
    KeyValueStorage, LEGACY_HISTORY_KEY, LEGACY_SCOPE_KEY, SCHEMA_RECORD_KEY, VERSION_KEY,
};
use tabcalc_core::typeset::Typesetter;
use tabcalc_engine::{BasicMathEngine, TexMarkupRenderer};
use tabcalc_infrastructure::dto::encode_store;
use tabcalc_infrastructure::migration::{RawStore, current_schema_version};
use tabcalc_infrastructure::{MigrationOutcome, ScheduledPersister, SchemaMigrator};
use tokio::sync::broadcast;

/// Options for [`CalculatorContext::bootstrap`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    /// Label prefix for tabs created without an explicit hint.
    pub label_hint: String,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            label_hint: DEFAULT_LABEL_HINT.to_string(),
        }
    }
}

/// Owns the session store and everything needed to operate on it.
pub struct CalculatorContext {
    store: SessionStore,
    evaluator: ExpressionEvaluator,
    typesetter: Arc<dyn Typesetter>,
    persister: ScheduledPersister,
    /// Recall position within the active session's history.
    cursor: HistoryCursor,
    options: ContextOptions,
}

impl CalculatorContext {
    /// Loads, migrates and persists the stored state, then builds the context.
    ///
    /// Only reading storage can fail. Writing the migrated state is best
    /// effort; failures are logged and retried by the next mutation.
    pub fn bootstrap(storage: Arc<dyn KeyValueStorage>, options: ContextOptions) -> Result<Self> {
        let raw = RawStore::load(storage.as_ref())?;
        let stored_version = storage.get(VERSION_KEY)?;

        let outcome = SchemaMigrator::new().migrate(
            raw,
            stored_version.as_deref(),
            &current_schema_version(),
        );
        tracing::info!(
            "[Bootstrap] Loaded {} session(s), schema {}{}",
            outcome.store.len(),
            outcome.version,
            if outcome.fresh_install { " (fresh install)" } else { "" }
        );

        write_migrated_state(storage.as_ref(), stored_version.as_deref(), &outcome);

        let MigrationOutcome { mut store, .. } = outcome;
        let persister = ScheduledPersister::new(storage);
        store.attach_persister(Arc::new(persister.clone()));

        let cursor = HistoryCursor::at_end(store.active_session().history.len());
        Ok(Self {
            store,
            evaluator: ExpressionEvaluator::new(Arc::new(BasicMathEngine::new())),
            typesetter: Arc::new(TexMarkupRenderer::new()),
            persister,
            cursor,
            options,
        })
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn active_session(&self) -> &Session {
        self.store.active_session()
    }

    pub fn active_index(&self) -> usize {
        self.store.active_index()
    }

    pub fn cursor(&self) -> &HistoryCursor {
        &self.cursor
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// Renders an entry's display form as markup.
    pub fn render_markup(&self, entry: &EvaluationResult) -> String {
        self.typesetter.render_to_markup(entry.display_source())
    }

    /// Receives persistence failures reported after this call.
    pub fn failures(&self) -> broadcast::Receiver<CalcError> {
        self.persister.subscribe_failures()
    }

    // ============================================================================
    // Evaluation
    // ============================================================================

    /// Evaluates `input` in the active session and records the result.
    pub fn submit(&mut self, input: &str) -> EvaluationResult {
        let result = self
            .evaluator
            .evaluate(input, &self.store.active_session().scope);

        match result.result_text() {
            Some(text) => tracing::info!(
                "[Calculator] {} = {}",
                result.normalized_expression(),
                text
            ),
            None => tracing::info!(
                "[Calculator] {} failed: {}",
                result.original(),
                result.error_message().unwrap_or_default()
            ),
        }

        self.store.record_evaluation(result.clone());
        self.reset_cursor();
        result
    }

    // ============================================================================
    // Tab management
    // ============================================================================

    /// Opens a new tab and switches to it. A blank hint uses the configured one.
    pub fn new_tab(&mut self, label_hint: Option<&str>) -> usize {
        let hint = match label_hint.map(str::trim) {
            Some(hint) if !hint.is_empty() => hint.to_string(),
            _ => self.options.label_hint.clone(),
        };
        let index = self.store.create_session(&hint);
        self.reset_cursor();
        index
    }

    pub fn close_tab(&mut self, index: usize) -> Result<()> {
        self.store.delete_session(index)?;
        self.reset_cursor();
        Ok(())
    }

    pub fn rename_tab(&mut self, index: usize, label: &str) -> Result<()> {
        self.store.rename_session(index, label.trim())
    }

    pub fn switch_tab(&mut self, index: usize) -> Result<()> {
        self.store.set_active(index)?;
        self.reset_cursor();
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.store.clear_active_history();
        self.reset_cursor();
    }

    // ============================================================================
    // History recall
    // ============================================================================

    /// Moves to the previous entry and returns its input.
    pub fn recall_previous(&mut self) -> &str {
        self.cursor.previous();
        self.cursor.recall(&self.store.active_session().history)
    }

    /// Moves to the next entry and returns its input (empty past the last).
    pub fn recall_next(&mut self) -> &str {
        self.cursor.next();
        self.cursor.recall(&self.store.active_session().history)
    }

    /// Writes the store synchronously, superseding any queued write.
    pub fn persist_now(&self) -> Result<()> {
        self.store.persist_now()
    }

    fn reset_cursor(&mut self) {
        self.cursor
            .reset(self.store.active_session().history.len());
    }
}

impl std::fmt::Debug for CalculatorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorContext")
            .field("store", &self.store)
            .field("cursor", &self.cursor)
            .field("options", &self.options)
            .finish()
    }
}

/// Writes the version tag, the current record and legacy removals.
///
/// Skipped when nothing changed, so a second bootstrap performs no writes.
fn write_migrated_state(
    storage: &dyn KeyValueStorage,
    stored_version: Option<&str>,
    outcome: &MigrationOutcome,
) {
    let version = outcome.version.to_string();
    let version_changed = stored_version != Some(version.as_str());
    if !version_changed && outcome.applied_steps.is_empty() && !outcome.legacy_cleared {
        tracing::debug!("[Bootstrap] Stored data already at schema {}", version);
        return;
    }

    let writes = encode_store(&outcome.store).and_then(|record| {
        storage.set(SCHEMA_RECORD_KEY, &record)?;
        if outcome.legacy_cleared {
            storage.remove(LEGACY_HISTORY_KEY)?;
            storage.remove(LEGACY_SCOPE_KEY)?;
        }
        // Tag last so an interrupted run migrates again.
        storage.set(VERSION_KEY, &version)
    });

    if let Err(e) = writes {
        tracing::error!("[Bootstrap] Failed to write migrated data: {}", e);
    }
}
