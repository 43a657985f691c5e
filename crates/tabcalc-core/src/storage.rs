//! Key-value storage capability.
//!
//! Defines the interface the persistence layer writes through. Values are
//! JSON documents stored as strings under well-known keys.

use crate::error::Result;

/// Key of the current (sessioned) store record.
pub const SCHEMA_RECORD_KEY: &str = "calculator";

/// Key of the flat history array written by the first release.
pub const LEGACY_HISTORY_KEY: &str = "calc-history";

/// Key of the flat scope object written by the first release.
pub const LEGACY_SCOPE_KEY: &str = "calc-scope";

/// Key of the schema version tag.
pub const VERSION_KEY: &str = "version";

/// An abstract, synchronous string key-value store.
///
/// # Implementation Notes
///
/// Implementations must tolerate removal of missing keys and may be shared
/// across threads (the persister writes from a spawned task).
pub trait KeyValueStorage: Send + Sync {
    /// Reads a value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Key present
    /// - `Ok(None)`: Key absent
    /// - `Err(_)`: Storage could not be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
