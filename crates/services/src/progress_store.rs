use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use lesson_core::model::{ProgressState, SectionId, sanitize};
use serde_json::Value;
use storage::repository::ProgressRepository;
use tokio::sync::watch;

use crate::Clock;

/// Outcome of the most recent persistence attempt, as shown to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved { at: DateTime<Utc> },
    Failed,
}

impl SaveStatus {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Saving => "Saving…",
            SaveStatus::Saved { .. } => "Saved",
            SaveStatus::Failed => "Not saved",
        }
    }
}

/// Holds the live `ProgressState` and mirrors it into one durable slot.
///
/// Persistence never fails from the caller's point of view: errors are logged and
/// surfaced through [`SaveStatus::Failed`], and the next persist tries again.
pub struct ProgressStore {
    repo: Arc<dyn ProgressRepository>,
    slot: String,
    entry: SectionId,
    clock: Clock,
    state: Mutex<ProgressState>,
    status: watch::Sender<SaveStatus>,
    write_lock: tokio::sync::Mutex<()>,
}

impl ProgressStore {
    /// Restores progress from `slot`, falling back to a fresh state when the slot is
    /// missing, unreadable or not JSON.
    pub async fn load(
        repo: Arc<dyn ProgressRepository>,
        slot: impl Into<String>,
        entry: SectionId,
        clock: Clock,
    ) -> Self {
        let slot = slot.into();
        let state = match repo.read_slot(&slot).await {
            Ok(Some(record)) => match serde_json::from_str::<Value>(&record.payload) {
                Ok(value) => {
                    tracing::debug!(slot = %slot, "restored saved progress");
                    sanitize(&value, &entry)
                }
                Err(err) => {
                    tracing::warn!(slot = %slot, error = %err, "saved progress is not JSON; starting fresh");
                    ProgressState::new(entry.clone())
                }
            },
            Ok(None) => ProgressState::new(entry.clone()),
            Err(err) => {
                tracing::warn!(slot = %slot, error = %err, "could not read saved progress; starting fresh");
                ProgressState::new(entry.clone())
            }
        };

        Self::with_state(repo, slot, entry, clock, state)
    }

    #[must_use]
    pub fn with_state(
        repo: Arc<dyn ProgressRepository>,
        slot: impl Into<String>,
        entry: SectionId,
        clock: Clock,
        state: ProgressState,
    ) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            repo,
            slot: slot.into(),
            entry,
            clock,
            state: Mutex::new(state),
            status,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    #[must_use]
    pub fn entry_id(&self) -> &SectionId {
        &self.entry
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressState {
        self.lock().clone()
    }

    /// Runs `f` against the live state. Does not persist.
    pub fn update<R>(&self, f: impl FnOnce(&mut ProgressState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Swaps in a whole new state, e.g. one decoded from a resume code. Does not persist.
    pub fn replace(&self, state: ProgressState) {
        *self.lock() = state;
    }

    /// Writes the current state to the slot.
    ///
    /// Writes run one at a time and each snapshots the state only once it holds the
    /// write lock, so the slot always ends up with the latest state.
    pub async fn persist(&self) {
        self.mark_saving();
        let _write = self.write_lock.lock().await;
        let payload = match serde_json::to_string(&self.snapshot()) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(slot = %self.slot, error = %err, "could not serialize progress");
                self.status.send_replace(SaveStatus::Failed);
                return;
            }
        };

        let at = self.clock.now();
        match self.repo.write_slot(&self.slot, &payload, at).await {
            Ok(()) => {
                tracing::debug!(slot = %self.slot, bytes = payload.len(), "progress saved");
                self.status.send_replace(SaveStatus::Saved { at });
            }
            Err(err) => {
                tracing::warn!(slot = %self.slot, error = %err, "progress not saved");
                self.status.send_replace(SaveStatus::Failed);
            }
        }
    }

    /// Replaces the state with a fresh one and persists it.
    pub async fn reset(&self) -> ProgressState {
        let fresh = ProgressState::new(self.entry.clone());
        self.replace(fresh.clone());
        self.persist().await;
        tracing::info!(slot = %self.slot, "progress reset");
        fresh
    }

    pub fn mark_saving(&self) {
        self.status.send_replace(SaveStatus::Saving);
    }

    #[must_use]
    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    const SLOT: &str = "eco_v2_state";

    fn entry() -> SectionId {
        SectionId::new("hello")
    }

    #[tokio::test]
    async fn missing_slot_loads_fresh_state() {
        let repo = InMemoryRepository::new();
        let store = ProgressStore::load(Arc::new(repo), SLOT, entry(), fixed_clock()).await;
        assert_eq!(store.snapshot(), ProgressState::new(entry()));
        assert_eq!(store.status(), SaveStatus::Idle);
    }

    #[tokio::test]
    async fn corrupt_slot_loads_fresh_state() {
        let repo = InMemoryRepository::new();
        repo.insert_raw(SLOT, "{not json", fixed_now());
        let store = ProgressStore::load(Arc::new(repo), SLOT, entry(), fixed_clock()).await;
        assert_eq!(store.snapshot(), ProgressState::new(entry()));
    }

    #[tokio::test]
    async fn saved_slot_is_sanitized_on_load() {
        let repo = InMemoryRepository::new();
        repo.insert_raw(
            SLOT,
            r#"{"v":2,"revealed":["the_call","hello","the_call"],"choices":{"k":"A"},"journals":{"j":7}}"#,
            fixed_now(),
        );
        let store = ProgressStore::load(Arc::new(repo), SLOT, entry(), fixed_clock()).await;
        let state = store.snapshot();
        let ids: Vec<&str> = state.revealed().iter().map(SectionId::as_str).collect();
        assert_eq!(ids, ["hello", "the_call"]);
        assert_eq!(state.choice("k"), Some("A"));
        assert!(state.journals().is_empty());
    }

    #[tokio::test]
    async fn persist_reports_saved_then_failed() {
        let repo = InMemoryRepository::new();
        let store = ProgressStore::load(Arc::new(repo.clone()), SLOT, entry(), fixed_clock()).await;
        let mut status = store.subscribe();

        store.persist().await;
        assert_eq!(store.status(), SaveStatus::Saved { at: fixed_now() });
        assert!(status.has_changed().unwrap());
        assert_eq!(*status.borrow_and_update(), SaveStatus::Saved { at: fixed_now() });

        repo.fail_writes(true);
        store.persist().await;
        assert_eq!(store.status(), SaveStatus::Failed);
        assert_eq!(store.status().label(), "Not saved");
        assert_eq!(repo.write_count(), 1);
    }

    #[tokio::test]
    async fn reset_persists_fresh_state() {
        let repo = InMemoryRepository::new();
        repo.insert_raw(SLOT, r#"{"revealed":["hello","the_call"]}"#, fixed_now());
        let store = ProgressStore::load(Arc::new(repo.clone()), SLOT, entry(), fixed_clock()).await;
        assert_eq!(store.snapshot().revealed().len(), 2);

        let fresh = store.reset().await;
        assert_eq!(fresh, ProgressState::new(entry()));
        let saved = repo.read_slot(SLOT).await.unwrap().unwrap();
        assert_eq!(
            saved.payload,
            r#"{"v":2,"revealed":["hello"],"choices":{},"journals":{},"pendingContinues":{}}"#
        );
    }
}
