use async_trait::async_trait;
use blockpad_core::{Document, DocumentStore, SaveController, SaveStatus, StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

const DEBOUNCE: Duration = Duration::from_millis(1_000);

/// Records every snapshot it is asked to save.
#[derive(Default)]
struct RecordingStore {
    saved: Mutex<Vec<Document>>,
    fail: AtomicBool,
}

impl RecordingStore {
    fn count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    fn last_title(&self) -> Option<String> {
        self.saved
            .lock()
            .unwrap()
            .last()
            .map(|document| document.title().to_string())
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn save(&self, document: &Document) -> StoreResult<()> {
        self.saved.lock().unwrap().push(document.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Failed("disk full".to_string()));
        }
        Ok(())
    }
}

/// Blocks every save until released.
#[derive(Default)]
struct GatedStore {
    started: AtomicUsize,
    finished: AtomicUsize,
    release: Notify,
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn save(&self, _document: &Document) -> StoreResult<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn titled(title: &str) -> Document {
    Document::new(title)
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[tokio::test(start_paused = true)]
async fn burst_of_edits_saves_once_with_latest_snapshot() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone(), DEBOUNCE);
    assert_eq!(controller.status(), SaveStatus::Saved);

    for index in 0..5 {
        controller.notify_mutation(titled(&format!("v{index}")));
        assert_eq!(controller.status(), SaveStatus::Unsaved);
        advance(Duration::from_millis(500)).await;
    }
    assert_eq!(store.count(), 0);

    advance(Duration::from_millis(600)).await;
    assert_eq!(store.count(), 1);
    assert_eq!(store.last_title().as_deref(), Some("v4"));
    assert_eq!(controller.status(), SaveStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn failed_save_stays_unsaved_and_next_edit_retries() {
    let store = Arc::new(RecordingStore::default());
    store.fail.store(true, Ordering::SeqCst);
    let controller = SaveController::new(store.clone(), DEBOUNCE);

    controller.notify_mutation(titled("first"));
    advance(Duration::from_millis(1_100)).await;
    assert_eq!(store.count(), 1);
    assert_eq!(controller.status(), SaveStatus::Unsaved);

    advance(Duration::from_secs(10)).await;
    assert_eq!(store.count(), 1, "no automatic retry without a new edit");

    store.fail.store(false, Ordering::SeqCst);
    controller.notify_mutation(titled("second"));
    advance(Duration::from_millis(1_100)).await;
    assert_eq!(store.count(), 2);
    assert_eq!(controller.status(), SaveStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn edit_during_save_does_not_abort_it_and_keeps_unsaved() {
    let store = Arc::new(GatedStore::default());
    let controller = SaveController::new(store.clone(), DEBOUNCE);

    controller.notify_mutation(titled("first"));
    advance(Duration::from_millis(1_100)).await;
    assert_eq!(store.started.load(Ordering::SeqCst), 1);
    assert_eq!(controller.status(), SaveStatus::Saving);

    controller.notify_mutation(titled("second"));
    assert_eq!(controller.status(), SaveStatus::Unsaved);

    store.release.notify_one();
    advance(Duration::from_millis(10)).await;
    assert_eq!(store.finished.load(Ordering::SeqCst), 1);
    assert_eq!(
        controller.status(),
        SaveStatus::Unsaved,
        "superseded success must not report saved"
    );

    advance(Duration::from_millis(1_000)).await;
    assert_eq!(store.started.load(Ordering::SeqCst), 2);
    store.release.notify_one();
    advance(Duration::from_millis(10)).await;
    assert_eq!(controller.status(), SaveStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn subscribers_observe_transitions() {
    let store = Arc::new(GatedStore::default());
    let controller = SaveController::new(store.clone(), DEBOUNCE);
    let mut status = controller.subscribe();

    controller.notify_mutation(titled("draft"));
    status.changed().await.unwrap();
    assert_eq!(*status.borrow_and_update(), SaveStatus::Unsaved);

    status.changed().await.unwrap();
    assert_eq!(*status.borrow_and_update(), SaveStatus::Saving);

    store.release.notify_one();
    status.changed().await.unwrap();
    assert_eq!(*status.borrow_and_update(), SaveStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn flush_now_cancels_timer_and_saves_immediately() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone(), DEBOUNCE);

    controller.notify_mutation(titled("pending"));
    controller.flush_now(titled("closing")).await.unwrap();
    assert_eq!(store.count(), 1);
    assert_eq!(controller.status(), SaveStatus::Saved);

    advance(Duration::from_secs(5)).await;
    assert_eq!(store.count(), 1);
    assert_eq!(store.last_title().as_deref(), Some("closing"));
}

#[test]
fn mutation_without_runtime_marks_unsaved_without_panicking() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone(), DEBOUNCE);

    controller.notify_mutation(titled("offline"));
    assert_eq!(controller.status(), SaveStatus::Unsaved);
    assert_eq!(store.count(), 0);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    runtime.block_on(controller.flush_now(titled("offline"))).unwrap();
    assert_eq!(controller.status(), SaveStatus::Saved);
    assert_eq!(store.count(), 1);
}

#[test]
fn explicit_runtime_accepts_mutations_from_plain_threads() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::with_runtime(
        store.clone(),
        Duration::from_millis(10),
        runtime.handle().clone(),
    );

    controller.notify_mutation(titled("first"));
    controller.notify_mutation(titled("second"));
    runtime.block_on(async { tokio::time::sleep(Duration::from_millis(100)).await });

    assert_eq!(store.count(), 1);
    assert_eq!(store.last_title().as_deref(), Some("second"));
    assert_eq!(controller.status(), SaveStatus::Saved);
}
