//! Debounced save trigger with a tri-state status.
//!
//! # Responsibility
//! - Turn a stream of document mutations into one trailing-edge save.
//! - Publish `Saved -> Unsaved -> Saving -> Saved` transitions to observers.
//!
//! # Invariants
//! - Every mutation moves the status to `Unsaved` and restarts the timer.
//! - A timer only fires for the newest mutation generation.
//! - An in-flight save is never aborted by a newer debounce cycle.
//! - A failed save leaves `Unsaved`; a cancelled save leaves the status as is.
//!   A cancellation with no newer mutation therefore stays `Saving` until the
//!   next mutation or `flush_now`.
//! - A successful save only reports `Saved` if no newer mutation arrived.
//! - Mutations never panic: without a runtime handle the status moves to
//!   `Unsaved` and the document waits for `flush_now`.

use crate::editor::debounce::DebounceSlot;
use crate::model::document::Document;
use crate::store::{DocumentStore, StoreResult};
use log::{debug, info, warn};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Persistence state shown by the save indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Unsaved,
    Saving,
}

impl SaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::Unsaved => "unsaved",
            Self::Saving => "saving",
        }
    }
}

impl Display for SaveStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Debounced persistence trigger for one document.
pub struct SaveController {
    shared: Arc<Shared>,
    debounce: Duration,
}

struct Shared {
    store: Arc<dyn DocumentStore>,
    /// Runtime that debounce timers and saves are spawned on.
    runtime: Option<Handle>,
    status: watch::Sender<SaveStatus>,
    timer: Mutex<TimerState>,
}

struct TimerState {
    /// Incremented on every mutation; a fired timer or finished save only
    /// acts if its generation is still current.
    generation: u64,
    slot: DebounceSlot,
}

impl SaveController {
    /// Uses the runtime of the calling context, if there is one.
    pub fn new(store: Arc<dyn DocumentStore>, debounce: Duration) -> Self {
        Self::build(store, debounce, Handle::try_current().ok())
    }

    /// Spawns timers on `runtime`, so mutations may come from any thread.
    pub fn with_runtime(store: Arc<dyn DocumentStore>, debounce: Duration, runtime: Handle) -> Self {
        Self::build(store, debounce, Some(runtime))
    }

    fn build(store: Arc<dyn DocumentStore>, debounce: Duration, runtime: Option<Handle>) -> Self {
        let (status, _) = watch::channel(SaveStatus::Saved);
        Self {
            shared: Arc::new(Shared {
                store,
                runtime,
                status,
                timer: Mutex::new(TimerState {
                    generation: 0,
                    slot: DebounceSlot::new(),
                }),
            }),
            debounce,
        }
    }

    pub fn status(&self) -> SaveStatus {
        *self.shared.status.borrow()
    }

    /// Observes status transitions.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }

    /// Records a mutation and (re)arms the debounce timer with `snapshot`.
    pub fn notify_mutation(&self, snapshot: Document) {
        let mut timer = self.shared.lock_timer();
        timer.generation += 1;
        let generation = timer.generation;
        self.shared.transition(SaveStatus::Unsaved);

        let Some(runtime) = self.shared.runtime.clone() else {
            warn!(
                "event=save_schedule module=save status=skipped reason=no_runtime generation={generation}"
            );
            return;
        };
        let shared = Arc::clone(&self.shared);
        timer.slot.arm(&runtime, self.debounce, async move {
            Shared::fire(shared, generation, snapshot);
        });
    }

    /// Cancels any pending timer and saves `snapshot` right away.
    pub async fn flush_now(&self, snapshot: Document) -> StoreResult<()> {
        let generation = {
            let mut timer = self.shared.lock_timer();
            timer.slot.cancel();
            timer.generation += 1;
            timer.generation
        };
        self.shared.transition(SaveStatus::Saving);
        let result = self.shared.store.save(&snapshot).await;
        let outcome = match &result {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancellation() => Err(Outcome::Cancelled),
            Err(err) => Err(Outcome::Failed(err.to_string())),
        };
        self.shared.finish(generation, outcome);
        result
    }
}

impl Drop for SaveController {
    fn drop(&mut self) {
        self.shared.lock_timer().slot.cancel();
    }
}

enum Outcome {
    Cancelled,
    Failed(String),
}

impl Shared {
    fn lock_timer(&self) -> MutexGuard<'_, TimerState> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer expiry: start the save if no newer mutation superseded it.
    ///
    /// The save runs on its own task so re-arming the slot cannot abort it.
    fn fire(shared: Arc<Shared>, generation: u64, snapshot: Document) {
        {
            let timer = shared.lock_timer();
            if timer.generation != generation {
                return;
            }
            shared.transition(SaveStatus::Saving);
        }

        tokio::spawn(async move {
            let outcome = match shared.store.save(&snapshot).await {
                Ok(()) => Ok(()),
                Err(err) if err.is_cancellation() => Err(Outcome::Cancelled),
                Err(err) => Err(Outcome::Failed(err.to_string())),
            };
            shared.finish(generation, outcome);
        });
    }

    fn finish(&self, generation: u64, outcome: Result<(), Outcome>) {
        let timer = self.lock_timer();
        let current = timer.generation == generation;
        match outcome {
            Ok(()) if current => self.transition(SaveStatus::Saved),
            Ok(()) => debug!(
                "event=save_finish module=save status=superseded generation={generation}"
            ),
            Err(Outcome::Cancelled) => debug!(
                "event=save_finish module=save status=cancelled generation={generation}"
            ),
            Err(Outcome::Failed(reason)) => {
                warn!(
                    "event=save_finish module=save status=error generation={generation} error={reason}"
                );
                if current {
                    self.transition(SaveStatus::Unsaved);
                }
            }
        }
    }

    fn transition(&self, next: SaveStatus) {
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            info!("event=save_status module=save from={} to={}", current, next);
            *current = next;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{SaveController, SaveStatus};
    use crate::model::document::Document;
    use crate::store::{DocumentStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CancellingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for CancellingStore {
        async fn save(&self, _document: &Document) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Cancelled)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_save_leaves_status_untouched() {
        let store = Arc::new(CancellingStore {
            calls: AtomicUsize::new(0),
        });
        let controller = SaveController::new(store.clone(), Duration::from_secs(1));

        controller.notify_mutation(Document::new("Draft"));
        tokio::time::sleep(Duration::from_millis(1_100)).await;

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.status(), SaveStatus::Saving);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_controller_cancels_pending_timer() {
        let store = Arc::new(CancellingStore {
            calls: AtomicUsize::new(0),
        });
        let controller = SaveController::new(store.clone(), Duration::from_secs(1));
        controller.notify_mutation(Document::new("Draft"));
        drop(controller);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }
}
