use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// A collector handed the normalizer something that is not a JSON object.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error(
        "Another run for '{target_location}' (pid {process_id}) holds the lock since {started_at}"
    )]
    ConcurrentRun {
        started_at: DateTime<Utc>,
        target_location: String,
        process_id: u32,
    },

    #[error("Run finalization failed: {0}")]
    RunFinalization(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}

/// Failure of a single source invocation. Recovered by the coordinator,
/// never propagated past it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("{source_name} timed out after {}s", after.as_secs())]
    Timeout { source_name: String, after: Duration },

    #[error("{source_name} failed: {message}")]
    Execution { source_name: String, message: String },
}

impl SourceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceError::Timeout { .. })
    }
}
