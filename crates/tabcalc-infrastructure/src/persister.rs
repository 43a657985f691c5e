//! Deferred, coalescing persistence of the session store.

use crate::dto::encode_store;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tabcalc_core::error::{CalcError, Result};
use tabcalc_core::session::{SessionStore, StorePersister};
use tabcalc_core::storage::{KeyValueStorage, SCHEMA_RECORD_KEY};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

/// Capacity of the failure channel; slow subscribers miss older failures.
const FAILURE_CHANNEL_CAPACITY: usize = 16;

/// Writes the session store under the `calculator` key.
///
/// [`schedule`](StorePersister::schedule) keeps only the latest snapshot and,
/// inside a tokio runtime, flushes it on a spawned task after yielding once.
/// Mutations made in the same tick therefore produce a single write. Outside a
/// runtime the snapshot is written immediately.
///
/// Write failures never reach the mutating caller. They are logged and sent to
/// [`subscribe_failures`](ScheduledPersister::subscribe_failures) receivers.
#[derive(Clone)]
pub struct ScheduledPersister {
    inner: Arc<PersisterInner>,
}

struct PersisterInner {
    storage: Arc<dyn KeyValueStorage>,
    /// Latest encoded snapshot not yet written.
    pending: Mutex<Option<String>>,
    /// Held from taking a snapshot until it is written, so writes land in
    /// the order their snapshots were taken.
    writer: Mutex<()>,
    flush_queued: AtomicBool,
    writes: AtomicU64,
    failures: broadcast::Sender<CalcError>,
}

impl ScheduledPersister {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(PersisterInner {
                storage,
                pending: Mutex::new(None),
                writer: Mutex::new(()),
                flush_queued: AtomicBool::new(false),
                writes: AtomicU64::new(0),
                failures,
            }),
        }
    }

    /// Receives every persistence failure reported after this call.
    pub fn subscribe_failures(&self) -> broadcast::Receiver<CalcError> {
        self.inner.failures.subscribe()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// True while a snapshot is waiting to be written.
    pub fn has_pending(&self) -> bool {
        self.inner.lock_pending().is_some()
    }
}

impl PersisterInner {
    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, snapshot: &str) -> Result<()> {
        self.storage
            .set(SCHEMA_RECORD_KEY, snapshot)
            .map_err(|e| CalcError::persistence(format!("Failed to write session store: {}", e)))?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Writes the pending snapshot, if any.
    fn flush(&self) {
        self.flush_queued.store(false, Ordering::SeqCst);
        let _writing = self.lock_writer();
        let Some(snapshot) = self.lock_pending().take() else {
            return;
        };

        match self.write(&snapshot) {
            Ok(()) => tracing::debug!("[Persist] Session store written ({} bytes)", snapshot.len()),
            Err(e) => self.report(e),
        }
    }

    fn report(&self, error: CalcError) {
        tracing::error!("[Persist] {}", error);
        // No receivers is fine; the failure has been logged.
        let _ = self.failures.send(error);
    }
}

impl StorePersister for ScheduledPersister {
    fn schedule(&self, store: &SessionStore) {
        let snapshot = match encode_store(store) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.inner.report(CalcError::persistence(format!(
                    "Failed to encode session store: {}",
                    e
                )));
                return;
            }
        };
        *self.inner.lock_pending() = Some(snapshot);

        match Handle::try_current() {
            Ok(handle) => {
                if !self.inner.flush_queued.swap(true, Ordering::SeqCst) {
                    let inner = Arc::clone(&self.inner);
                    handle.spawn(async move {
                        tokio::task::yield_now().await;
                        inner.flush();
                    });
                }
            }
            Err(_) => self.inner.flush(),
        }
    }

    fn persist_now(&self, store: &SessionStore) -> Result<()> {
        let snapshot = encode_store(store)?;
        let _writing = self.inner.lock_writer();
        // Supersedes anything still queued.
        self.inner.lock_pending().take();
        self.inner.write(&snapshot).inspect_err(|e| {
            tracing::error!("[Persist] {}", e);
        })
    }
}

impl std::fmt::Debug for ScheduledPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledPersister")
            .field("writes", &self.write_count())
            .field("flush_queued", &self.inner.flush_queued.load(Ordering::SeqCst))
            .finish()
    }
}
