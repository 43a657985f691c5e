//! Schema migrator: upgrades raw persisted data into a current `SessionStore`.

use super::raw::RawStore;
use super::registry::MigrationRegistry;
use super::sections::decode_section;
use super::version::{FLAT_LAYOUT_VERSION, flat_layout_version, stored_version_or_zero};
use crate::dto::{FlatLayoutV1_0_0, SessionStoreDTO};
use semver::Version;
use tabcalc_core::session::SessionStore;
use tabcalc_core::storage::{LEGACY_HISTORY_KEY, LEGACY_SCOPE_KEY, SCHEMA_RECORD_KEY};
use version_migrate::IntoDomain;

/// First version whose data lives in the `calculator` record.
const SESSIONED_LAYOUT: Version = Version::new(1, 1, 0);

/// Result of a migration run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    /// The store in the current schema.
    pub store: SessionStore,
    /// Version tag to persist.
    pub version: Version,
    /// No prior data of any kind was found.
    pub fresh_install: bool,
    /// Descriptions of the steps that ran, in order.
    pub applied_steps: Vec<String>,
    /// Flat sections were consumed and should be removed from storage.
    pub legacy_cleared: bool,
}

/// Brings persisted data up to the running schema version.
///
/// Never fails: corrupt sections are replaced by their defaults and logged.
#[derive(Debug)]
pub struct SchemaMigrator {
    registry: MigrationRegistry,
}

impl SchemaMigrator {
    /// Creates a migrator with the built-in step table.
    pub fn new() -> Self {
        Self::with_registry(super::build_migration_registry())
    }

    pub fn with_registry(registry: MigrationRegistry) -> Self {
        Self { registry }
    }

    /// Migrates `raw`, tagged with `stored_version`, to `current_version`.
    pub fn migrate(
        &self,
        mut raw: RawStore,
        stored_version: Option<&str>,
        current_version: &Version,
    ) -> MigrationOutcome {
        let had_legacy = raw.has_legacy_sections();

        let stored = match stored_version {
            Some(tag) => stored_version_or_zero(tag),
            None if had_legacy => {
                tracing::info!(
                    "[Migration] Untagged flat data found, assuming {}",
                    FLAT_LAYOUT_VERSION
                );
                flat_layout_version()
            }
            None => {
                let fresh_install = raw.schema_record.is_none();
                if fresh_install {
                    tracing::info!(
                        "[Migration] Fresh install, initializing schema {}",
                        current_version
                    );
                } else {
                    tracing::warn!(
                        "[Migration] Store record without version tag, decoding as {}",
                        current_version
                    );
                }
                return MigrationOutcome {
                    store: decode_store(&raw, current_version),
                    version: current_version.clone(),
                    fresh_install,
                    applied_steps: Vec::new(),
                    legacy_cleared: false,
                };
            }
        };

        let mut applied_steps = Vec::new();
        let upgrading = current_version > &stored;
        if upgrading {
            let pending = self.registry.pending(&stored, current_version);
            tracing::info!(
                "[Migration] Migrating from {} to {} ({} steps)",
                stored,
                current_version,
                pending.len()
            );

            for step in pending {
                tracing::info!(
                    "[Migration] {} -> {}: {}",
                    step.from_version(),
                    step.to_version(),
                    step.description()
                );
                if let Err(e) = step.apply(&mut raw) {
                    tracing::error!(
                        "[Migration] Step to {} failed, keeping data as is: {}",
                        step.to_version(),
                        e
                    );
                    break;
                }
                applied_steps.push(format!(
                    "{} -> {}: {}",
                    step.from_version(),
                    step.to_version(),
                    step.description()
                ));
            }
        } else {
            tracing::debug!(
                "[Migration] Stored schema {} is up to date (running {})",
                stored,
                current_version
            );
        }

        let layout = if upgrading { current_version } else { &stored };
        MigrationOutcome {
            store: decode_store(&raw, layout),
            version: current_version.clone(),
            fresh_install: false,
            applied_steps,
            legacy_cleared: had_legacy && !raw.has_legacy_sections(),
        }
    }
}

impl Default for SchemaMigrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes `raw` under the layout used by `schema` versions.
fn decode_store(raw: &RawStore, schema: &Version) -> SessionStore {
    if schema < &SESSIONED_LAYOUT {
        let flat = FlatLayoutV1_0_0 {
            history: decode_section(LEGACY_HISTORY_KEY, raw.legacy_history.as_deref())
                .unwrap_or_default(),
            scope: decode_section(LEGACY_SCOPE_KEY, raw.legacy_scope.as_deref())
                .unwrap_or_default(),
        };
        return flat.into_domain();
    }

    decode_section::<SessionStoreDTO>(SCHEMA_RECORD_KEY, raw.schema_record.as_deref())
        .map(|dto| dto.into_domain())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::encode_store;
    use crate::migration::version::current_schema_version;
    use tabcalc_core::evaluation::EvaluationResult;
    use tabcalc_core::value::Value;

    fn legacy_raw(history: &str, scope: &str) -> RawStore {
        RawStore {
            schema_record: None,
            legacy_history: Some(history.to_string()),
            legacy_scope: Some(scope.to_string()),
        }
    }

    #[test]
    fn test_fresh_install() {
        let outcome = SchemaMigrator::new().migrate(RawStore::default(), None, &current_schema_version());

        assert!(outcome.fresh_install);
        assert_eq!(outcome.store, SessionStore::default_store());
        assert_eq!(outcome.version, current_schema_version());
        assert!(outcome.applied_steps.is_empty());
    }

    #[test]
    fn test_untagged_flat_data_is_migrated() {
        let raw = legacy_raw(r#"[{"expression":"5","result":5}]"#, r#"{"ans":5}"#);
        let outcome = SchemaMigrator::new().migrate(raw, None, &current_schema_version());

        assert!(!outcome.fresh_install);
        assert!(outcome.legacy_cleared);
        assert_eq!(outcome.applied_steps.len(), 1);
        assert_eq!(outcome.store.len(), 1);
        assert_eq!(outcome.store.active_index(), 0);
        let session = outcome.store.active_session();
        assert_eq!(session.scope.ans(), &Value::Number(5.0));
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn test_untagged_flat_data_matches_flat_layout_tag() {
        let history = r#"[{"expression":"2+2","result":4}]"#;
        let scope = r#"{"ans":4,"x":1}"#;

        let untagged = SchemaMigrator::new().migrate(
            legacy_raw(history, scope),
            None,
            &current_schema_version(),
        );
        let tagged = SchemaMigrator::new().migrate(
            legacy_raw(history, scope),
            Some(FLAT_LAYOUT_VERSION),
            &current_schema_version(),
        );

        assert_eq!(untagged, tagged);
    }

    #[test]
    fn test_untagged_record_is_kept() {
        let mut store = SessionStore::default_store();
        store.rename_session(0, "Kept").unwrap();
        let raw = RawStore {
            schema_record: Some(encode_store(&store).unwrap()),
            ..RawStore::default()
        };

        let outcome = SchemaMigrator::new().migrate(raw, None, &current_schema_version());
        assert!(!outcome.fresh_install);
        assert_eq!(outcome.store, store);
    }

    #[test]
    fn test_up_to_date_data_is_decoded_unchanged() {
        let mut store = SessionStore::default_store();
        store.create_session("Tab");
        store.record_evaluation(EvaluationResult::success("2", "2", "2", Value::Number(2.0)));
        let raw = RawStore {
            schema_record: Some(encode_store(&store).unwrap()),
            ..RawStore::default()
        };

        let outcome = SchemaMigrator::new().migrate(raw, Some("1.1"), &current_schema_version());
        assert!(outcome.applied_steps.is_empty());
        assert_eq!(outcome.store, store);
    }

    #[test]
    fn test_garbage_version_forces_full_migration() {
        let raw = legacy_raw("[]", r#"{"ans":9}"#);
        let outcome = SchemaMigrator::new().migrate(raw, Some("not-a-version"), &current_schema_version());

        assert_eq!(outcome.applied_steps.len(), 1);
        assert_eq!(outcome.store.active_session().scope.ans(), &Value::Number(9.0));
    }

    #[test]
    fn test_older_running_version_decodes_flat_layout() {
        let raw = legacy_raw("[]", r#"{"ans":4}"#);
        let outcome = SchemaMigrator::new().migrate(raw, Some("1.0.0"), &Version::new(1, 0, 0));

        assert!(outcome.applied_steps.is_empty());
        assert!(!outcome.legacy_cleared);
        assert_eq!(outcome.store.active_session().scope.ans(), &Value::Number(4.0));
    }

    #[test]
    fn test_corrupt_record_gives_default_store() {
        let raw = RawStore {
            schema_record: Some("{\"tabs\": [".to_string()),
            ..RawStore::default()
        };
        let outcome = SchemaMigrator::new().migrate(raw, Some("1.1.0"), &current_schema_version());
        assert_eq!(outcome.store, SessionStore::default_store());
    }
}
