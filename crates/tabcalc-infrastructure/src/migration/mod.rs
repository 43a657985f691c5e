//! Schema migration framework for TabCalc.
//!
//! Persisted data carries a version tag under the `version` key. At startup
//! the [`SchemaMigrator`] compares it with the running schema version and
//! applies every pending [`MigrationStep`] of the registry in order:
//!
//! ```text
//!   stored version ──► MigrationRegistry::pending(stored, current)
//!                          │
//!                          V
//!                    FlatToSessionedMigration   (1.0.0 → 1.1.0)
//!                          │
//!                          V
//!                    decode `calculator` ──► SessionStore
//! ```
//!
//! # Adding a Schema Version
//!
//! 1. Add the new DTO in `dto` with `#[versioned(version = "x.y.z")]`
//! 2. Implement `MigratesTo` from the previous DTO
//! 3. Implement a `MigrationStep` that rewrites the raw sections
//! 4. Register it in [`build_migration_registry`] and bump
//!    [`CURRENT_SCHEMA_VERSION`]

mod flat_to_sessioned;
mod migrator;
mod raw;
mod registry;
mod sections;
mod traits;
mod version;

// Public API
pub use flat_to_sessioned::FlatToSessionedMigration;
pub use migrator::{MigrationOutcome, SchemaMigrator};
pub use raw::RawStore;
pub use registry::MigrationRegistry;
pub use traits::MigrationStep;
pub use version::{
    CURRENT_SCHEMA_VERSION, FLAT_LAYOUT_VERSION, current_schema_version, flat_layout_version,
    parse_version_tag, stored_version_or_zero,
};

use std::sync::Arc;

/// Builds the registry with every schema step, in order.
pub fn build_migration_registry() -> MigrationRegistry {
    let mut registry = MigrationRegistry::new(current_schema_version());
    registry.register_all(vec![Arc::new(FlatToSessionedMigration)]);
    registry
}
