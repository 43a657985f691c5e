//! Flat layout (1.0.0) to sessioned layout (1.1.0).

use super::raw::RawStore;
use super::sections::decode_section;
use super::traits::MigrationStep;
use super::version::flat_layout_version;
use crate::dto::{FlatLayoutV1_0_0, SessionStoreV1_1_0};
use semver::Version;
use tabcalc_core::error::Result;
use tabcalc_core::storage::{LEGACY_HISTORY_KEY, LEGACY_SCOPE_KEY};
use version_migrate::MigratesTo;

/// Wraps the flat history and scope into a single tab and drops the flat keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatToSessionedMigration;

impl MigrationStep for FlatToSessionedMigration {
    fn from_version(&self) -> Version {
        flat_layout_version()
    }

    fn to_version(&self) -> Version {
        Version::new(1, 1, 0)
    }

    fn description(&self) -> &str {
        "Wrap flat history and scope into a single tab"
    }

    fn apply(&self, raw: &mut RawStore) -> Result<()> {
        if !raw.has_legacy_sections() {
            if raw.schema_record.is_some() {
                tracing::debug!("[Migration] No flat sections, keeping existing store record");
            }
            return Ok(());
        }

        if raw.schema_record.is_some() {
            tracing::warn!(
                "[Migration] Both flat sections and a store record exist; flat data wins"
            );
        }

        let flat = FlatLayoutV1_0_0 {
            history: decode_section(LEGACY_HISTORY_KEY, raw.legacy_history.as_deref())
                .unwrap_or_default(),
            scope: decode_section(LEGACY_SCOPE_KEY, raw.legacy_scope.as_deref())
                .unwrap_or_default(),
        };
        let migrated: SessionStoreV1_1_0 = flat.migrate();

        raw.schema_record = Some(serde_json::to_string(&migrated)?);
        raw.legacy_history = None;
        raw.legacy_scope = None;
        Ok(())
    }
}
