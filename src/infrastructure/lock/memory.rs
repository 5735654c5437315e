use crate::domain::error::DomainError;
use crate::domain::ports::lock_store::{LockStore, RunLockRecord};
use std::sync::Mutex;

/// Process-local lock store, for tests and single-shot embedding.
#[derive(Default)]
pub struct InMemoryLockStore {
    record: Mutex<Option<RunLockRecord>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a marker already present.
    pub fn holding(record: RunLockRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl LockStore for InMemoryLockStore {
    fn read(&self) -> Result<Option<RunLockRecord>, DomainError> {
        let guard = self
            .record
            .lock()
            .map_err(|e| DomainError::Lock(e.to_string()))?;
        Ok(guard.clone())
    }

    fn write(&self, record: &RunLockRecord) -> Result<(), DomainError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| DomainError::Lock(e.to_string()))?;
        *guard = Some(record.clone());
        Ok(())
    }

    fn release(&self) -> Result<(), DomainError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| DomainError::Lock(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}
