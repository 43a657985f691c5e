//! Persistence hook for the session store.

use super::store::SessionStore;
use crate::error::Result;

/// Writes the whole session store to durable storage.
///
/// Attached to a [`SessionStore`]; every mutator calls [`StorePersister::schedule`]
/// after changing state.
pub trait StorePersister: Send + Sync {
    /// Requests a deferred write of `store`.
    ///
    /// Must not block on I/O and must not report failures to the caller.
    /// Several calls before the write happens produce a single write of the
    /// latest snapshot.
    fn schedule(&self, store: &SessionStore);

    /// Writes `store` immediately.
    fn persist_now(&self, store: &SessionStore) -> Result<()>;
}
