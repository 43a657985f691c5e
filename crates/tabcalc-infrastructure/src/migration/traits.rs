//! Core trait for schema migration steps.

use super::raw::RawStore;
use semver::Version;
use tabcalc_core::error::Result;

/// One upgrade step of the persisted schema.
///
/// Steps operate on the raw sections so that each one only needs to know the
/// layout it reads and the layout it writes.
pub trait MigrationStep: Send + Sync + std::fmt::Debug {
    /// Returns the source version this step starts from.
    fn from_version(&self) -> Version;

    /// Returns the target version this step produces.
    fn to_version(&self) -> Version;

    /// Returns a human-readable description of this step.
    ///
    /// Used for logging and reporting.
    fn description(&self) -> &str;

    /// Rewrites `raw` from the source layout into the target layout.
    ///
    /// Steps must be idempotent: applying one to data already in the target
    /// layout leaves it unchanged. Corrupt input sections are replaced by their
    /// defaults rather than reported as errors.
    fn apply(&self, raw: &mut RawStore) -> Result<()>;
}
