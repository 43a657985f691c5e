//! Raw persisted sections, read once at startup.

use tabcalc_core::error::Result;
use tabcalc_core::storage::{
    KeyValueStorage, LEGACY_HISTORY_KEY, LEGACY_SCOPE_KEY, SCHEMA_RECORD_KEY,
};

/// The undecoded data sections of the key-value store.
///
/// Migration steps rewrite these strings; decoding into the domain model
/// happens once all steps have run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStore {
    /// `calculator`
    pub schema_record: Option<String>,
    /// `calc-history`
    pub legacy_history: Option<String>,
    /// `calc-scope`
    pub legacy_scope: Option<String>,
}

impl RawStore {
    /// Reads all data sections from `storage`.
    pub fn load(storage: &dyn KeyValueStorage) -> Result<Self> {
        Ok(Self {
            schema_record: storage.get(SCHEMA_RECORD_KEY)?,
            legacy_history: storage.get(LEGACY_HISTORY_KEY)?,
            legacy_scope: storage.get(LEGACY_SCOPE_KEY)?,
        })
    }

    pub fn has_legacy_sections(&self) -> bool {
        self.legacy_history.is_some() || self.legacy_scope.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.schema_record.is_none() && !self.has_legacy_sections()
    }
}
