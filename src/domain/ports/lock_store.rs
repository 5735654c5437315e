use crate::domain::error::DomainError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The run marker. Its presence means a run is (or was) in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLockRecord {
    pub timestamp: DateTime<Utc>,
    pub target_location: String,
    pub process_id: u32,
}

impl RunLockRecord {
    pub fn new(target_location: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            target_location: target_location.to_string(),
            process_id: std::process::id(),
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }
}

/// Durable storage for the single run-level lock.
///
/// Acquisition is read-check-then-write, not compare-and-swap: two
/// processes starting in the same instant can both pass the check.
pub trait LockStore: Send + Sync {
    fn read(&self) -> Result<Option<RunLockRecord>, DomainError>;

    fn write(&self, record: &RunLockRecord) -> Result<(), DomainError>;

    /// Remove the marker. Removing an absent marker is not an error.
    fn release(&self) -> Result<(), DomainError>;

    fn is_stale(&self, record: &RunLockRecord, now: DateTime<Utc>, stale_after: Duration) -> bool {
        record.age(now) >= stale_after
    }

    /// Write `record` unless a fresh marker exists.
    ///
    /// Returns the stale marker that was overridden, if any. A fresh marker
    /// yields [`DomainError::ConcurrentRun`] and is left untouched.
    fn acquire(
        &self,
        record: &RunLockRecord,
        stale_after: Duration,
    ) -> Result<Option<RunLockRecord>, DomainError> {
        let existing = self.read()?;
        if let Some(held) = &existing {
            if !self.is_stale(held, record.timestamp, stale_after) {
                return Err(DomainError::ConcurrentRun {
                    started_at: held.timestamp,
                    target_location: held.target_location.clone(),
                    process_id: held.process_id,
                });
            }
        }
        self.write(record)?;
        Ok(existing)
    }
}
