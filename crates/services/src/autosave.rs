use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::progress_store::ProgressStore;

/// Debounced persistence for high-frequency edits such as journal typing.
///
/// Each [`schedule`](Self::schedule) replaces the pending write, so a burst of edits
/// results in one write of the latest state once the burst has been quiet for `delay`.
pub struct Autosave {
    store: Arc<ProgressStore>,
    delay: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Autosave {
    #[must_use]
    pub fn new(store: Arc<ProgressStore>, delay: Duration, runtime: Handle) -> Self {
        Self {
            store,
            delay,
            runtime,
            pending: Mutex::new(None),
        }
    }

    pub fn schedule(&self) {
        self.store.mark_saving();
        let store = Arc::clone(&self.store);
        let delay = self.delay;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            store.persist().await;
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Discards the pending write, if any. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(task) if !task.is_finished() => {
                task.abort();
                tracing::debug!("pending autosave discarded");
                true
            }
            _ => false,
        }
    }

    /// Cancels the pending write and persists right away.
    pub async fn flush(&self) {
        self.cancel();
        self.store.persist().await;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.cancel();
    }
}
