use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS run_sessions (
            id TEXT PRIMARY KEY,
            target_location TEXT NOT NULL,
            status TEXT NOT NULL,
            error_message TEXT,
            started_at TEXT NOT NULL,
            completed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS run_events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            source TEXT,
            status TEXT NOT NULL,
            lead_count INTEGER NOT NULL DEFAULT 0,
            message TEXT,
            recorded_at TEXT NOT NULL,
            UNIQUE (run_id, kind, source)
        );

        CREATE TABLE IF NOT EXISTS run_lock (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            acquired_at TEXT NOT NULL,
            target_location TEXT NOT NULL,
            process_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_run_events_run ON run_events(run_id);
        CREATE INDEX IF NOT EXISTS idx_run_sessions_started ON run_sessions(started_at);
        ",
    )
    .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
