use crate::domain::error::DomainError;
use crate::domain::ports::lock_store::{LockStore, RunLockRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

/// Run lock kept as the single row of the `run_lock` table.
pub struct SqliteLockStore {
    conn: Mutex<Connection>,
}

impl SqliteLockStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl LockStore for SqliteLockStore {
    fn read(&self) -> Result<Option<RunLockRecord>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Lock(e.to_string()))?;
        let row = conn
            .query_row(
                "SELECT acquired_at, target_location, process_id FROM run_lock WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| DomainError::Lock(format!("cannot read lock row: {e}")))?;

        Ok(row.and_then(|(acquired_at, target_location, process_id)| {
            let timestamp = DateTime::parse_from_rfc3339(&acquired_at)
                .ok()?
                .with_timezone(&Utc);
            Some(RunLockRecord {
                timestamp,
                target_location,
                process_id: u32::try_from(process_id).unwrap_or_default(),
            })
        }))
    }

    fn write(&self, record: &RunLockRecord) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Lock(e.to_string()))?;
        conn.execute(
            "INSERT INTO run_lock (id, acquired_at, target_location, process_id)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                acquired_at = excluded.acquired_at,
                target_location = excluded.target_location,
                process_id = excluded.process_id",
            params![
                record.timestamp.to_rfc3339(),
                record.target_location,
                record.process_id as i64
            ],
        )
        .map_err(|e| DomainError::Lock(format!("cannot write lock row: {e}")))?;
        Ok(())
    }

    fn release(&self) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Lock(e.to_string()))?;
        conn.execute("DELETE FROM run_lock WHERE id = 1", [])
            .map_err(|e| DomainError::Lock(format!("cannot clear lock row: {e}")))?;
        Ok(())
    }
}
