use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabcalc_core::error::{CalcError, Result};
use tabcalc_core::evaluation::EvaluationResult;
use tabcalc_core::session::{SessionStore, StorePersister};
use tabcalc_core::storage::{KeyValueStorage, SCHEMA_RECORD_KEY};
use tabcalc_core::value::Value;
use tabcalc_infrastructure::dto::encode_store;
use tabcalc_infrastructure::{MemoryStorage, ScheduledPersister};

/// Storage whose writes always fail.
struct ReadOnlyStorage;

impl KeyValueStorage for ReadOnlyStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(CalcError::io("read-only file system"))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(CalcError::io("read-only file system"))
    }
}

/// Storage whose first write blocks until the test releases it.
struct GatedStorage {
    inner: MemoryStorage,
    entered: Mutex<Option<Sender<()>>>,
    release: Mutex<Option<Receiver<()>>>,
}

impl GatedStorage {
    fn new() -> (Arc<Self>, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let storage = Arc::new(Self {
            inner: MemoryStorage::new(),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        (storage, entered_rx, release_tx)
    }
}

impl KeyValueStorage for GatedStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let gate = self.release.lock().unwrap().take();
        if let Some(release) = gate {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                entered.send(()).unwrap();
            }
            release.recv().unwrap();
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

fn attached_store(storage: Arc<dyn KeyValueStorage>) -> (SessionStore, ScheduledPersister) {
    let persister = ScheduledPersister::new(storage);
    let mut store = SessionStore::default_store();
    store.attach_persister(Arc::new(persister.clone()));
    (store, persister)
}

async fn wait_for_writes(persister: &ScheduledPersister, expected: u64) {
    for _ in 0..100 {
        if persister.write_count() >= expected && !persister.has_pending() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "expected {} writes, saw {}",
        expected,
        persister.write_count()
    );
}

#[tokio::test]
async fn test_mutations_in_one_tick_coalesce_into_one_write() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut store, persister) = attached_store(storage.clone());

    store.create_session("Tab");
    store.rename_session(1, "Scratch").unwrap();
    store.record_evaluation(EvaluationResult::success("1+1", "1 + 1", "1+1", Value::Number(2.0)));
    assert_eq!(persister.write_count(), 0);

    wait_for_writes(&persister, 1).await;
    assert_eq!(persister.write_count(), 1);
    assert_eq!(
        storage.get(SCHEMA_RECORD_KEY).unwrap(),
        Some(encode_store(&store).unwrap())
    );
}

#[tokio::test]
async fn test_later_mutation_schedules_another_write() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut store, persister) = attached_store(storage.clone());

    store.create_session("Tab");
    wait_for_writes(&persister, 1).await;

    store.set_active(0).unwrap();
    wait_for_writes(&persister, 2).await;

    assert_eq!(
        storage.get(SCHEMA_RECORD_KEY).unwrap(),
        Some(encode_store(&store).unwrap())
    );
}

#[test]
fn test_without_runtime_writes_immediately() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut store, persister) = attached_store(storage.clone());

    store.create_session("Tab");
    assert_eq!(persister.write_count(), 1);
    store.delete_session(0).unwrap();
    assert_eq!(persister.write_count(), 2);

    let persisted = storage.get(SCHEMA_RECORD_KEY).unwrap().unwrap();
    assert!(persisted.contains("\"Tab 2\""));
    assert!(!persisted.contains("\"Tab 1\""));
}

#[test]
fn test_write_failure_is_reported_and_memory_kept() {
    let (mut store, persister) = attached_store(Arc::new(ReadOnlyStorage));
    let mut failures = persister.subscribe_failures();

    let index = store.create_session("Tab");

    assert_eq!(index, 1);
    assert_eq!(store.len(), 2);
    assert_eq!(store.active_index(), 1);
    assert_eq!(persister.write_count(), 0);

    let failure = failures.try_recv().unwrap();
    assert!(matches!(failure, CalcError::Persistence(_)));
    assert!(failure.to_string().contains("read-only file system"));
}

#[test]
fn test_persist_now_surfaces_errors() {
    let (store, _persister) = attached_store(Arc::new(ReadOnlyStorage));
    let err = store.persist_now().unwrap_err();
    assert!(err.is_persistence());
}

#[test]
fn test_persist_now_writes_current_state() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut store, persister) = attached_store(storage.clone());
    store.rename_session(0, "Main").unwrap();

    store.persist_now().unwrap();

    assert!(!persister.has_pending());
    let persisted = storage.get(SCHEMA_RECORD_KEY).unwrap().unwrap();
    assert!(persisted.contains("\"Main\""));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_write_is_not_overtaken_by_older_snapshot() {
    let (storage, entered, release) = GatedStorage::new();
    let persister = ScheduledPersister::new(storage.clone());
    let mut store = SessionStore::default_store();

    persister.schedule(&store);
    tokio::task::spawn_blocking(move || entered.recv())
        .await
        .unwrap()
        .unwrap();

    // The first snapshot is now mid-write; schedule a newer one.
    store.create_session("Tab");
    persister.schedule(&store);
    tokio::time::sleep(Duration::from_millis(50)).await;
    release.send(()).unwrap();

    for _ in 0..200 {
        if persister.write_count() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(persister.write_count(), 2);
    assert_eq!(
        storage.get(SCHEMA_RECORD_KEY).unwrap(),
        Some(encode_store(&store).unwrap())
    );
}
