use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// A stored payload and when it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub key: String,
    pub payload: String,
    pub updated_at: DateTime<Utc>,
}

/// Named durable slots. Writes replace the whole payload.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Read a slot, `None` if it was never written or has been cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn read_slot(&self, key: &str) -> Result<Option<SlotRecord>, StorageError>;

    /// Create or overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the payload cannot be stored.
    async fn write_slot(
        &self,
        key: &str,
        payload: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// In-memory repository for tests and prototyping.
///
/// Clones share the same slots, so a test can keep a handle to flip
/// [`fail_writes`](Self::fail_writes) or count writes after handing one to a service.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    slots: Arc<Mutex<HashMap<String, SlotRecord>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail, like a browser storage quota error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Seeds a slot directly, bypassing the failure switch and the write counter.
    pub fn insert_raw(&self, key: &str, payload: &str, at: DateTime<Utc>) {
        if let Ok(mut guard) = self.slots.lock() {
            guard.insert(
                key.to_owned(),
                SlotRecord {
                    key: key.to_owned(),
                    payload: payload.to_owned(),
                    updated_at: at,
                },
            );
        }
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn read_slot(&self, key: &str) -> Result<Option<SlotRecord>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn write_slot(
        &self,
        key: &str,
        payload: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected("quota exceeded".into()));
        }
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            key.to_owned(),
            SlotRecord {
                key: key.to_owned(),
                payload: payload.to_owned(),
                updated_at: at,
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Repository handles used by the services layer.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(Arc::new(InMemoryRepository::new()))
    }

    #[must_use]
    pub fn from_repository(progress: Arc<dyn ProgressRepository>) -> Self {
        Self { progress }
    }
}
