pub mod lock_store;
pub mod migrations;
pub mod session_log;

use crate::domain::error::DomainError;
use rusqlite::Connection;
use std::path::Path;

/// Open (creating if needed) the run database and bring its schema up to date.
pub fn open_database(path: &Path) -> Result<Connection, DomainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| DomainError::Database(format!("cannot create {}: {e}", parent.display())))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}
