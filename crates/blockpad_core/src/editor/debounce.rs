//! Single-slot cancel-and-restart timer.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Holds at most one pending delayed task.
///
/// Arming the slot aborts whatever was pending, so only the most recently
/// armed task can ever run. Tasks are spawned on the given runtime handle,
/// so arming works from threads outside that runtime.
#[derive(Debug, Default)]
pub struct DebounceSlot {
    pending: Option<JoinHandle<()>>,
}

impl DebounceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the pending task and schedules `task` on `runtime` after `delay`.
    pub fn arm<F>(&mut self, runtime: &Handle, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Aborts the pending task. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let was_waiting = !handle.is_finished();
                handle.abort();
                was_waiting
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for DebounceSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
