use crate::domain::entities::run_session::SourceOutcome;
use crate::domain::error::DomainError;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::session_reporter::SessionReporter;
use crate::domain::values::run_status::RunStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// One past run, as recorded in the session log.
#[derive(Debug, Clone, Serialize)]
pub struct RunHistoryEntry {
    pub id: String,
    pub target_location: String,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub lead_count: i64,
    pub failed_sources: i64,
}

/// Append-only run log in SQLite. Duplicate source reports for the same run
/// are ignored. Timestamps come from the same clock the run uses.
pub struct SqliteSessionLog {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteSessionLog {
    pub fn new(conn: Connection, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn: Mutex::new(conn),
            clock,
        }
    }

    fn now_rfc3339(&self) -> String {
        self.clock.now().to_rfc3339()
    }

    fn append_event(
        &self,
        run_id: &str,
        kind: &str,
        source: &str,
        status: &str,
        lead_count: usize,
        message: Option<&str>,
    ) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR IGNORE INTO run_events (run_id, kind, source, status, lead_count, message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                kind,
                source,
                status,
                lead_count as i64,
                message,
                self.now_rfc3339()
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to append run event: {e}")))?;
        Ok(())
    }

    pub fn history(&self, limit: usize) -> Result<Vec<RunHistoryEntry>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.target_location, s.status, s.error_message, s.started_at, s.completed_at,
                    COALESCE(SUM(CASE WHEN e.kind = 'source' THEN e.lead_count ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN e.kind = 'source' AND e.status = 'error' THEN 1 ELSE 0 END), 0)
             FROM run_sessions s
             LEFT JOIN run_events e ON e.run_id = s.id
             GROUP BY s.id
             ORDER BY s.started_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let status_str: String = row.get(2)?;
            let started_str: String = row.get(4)?;
            let completed_str: Option<String> = row.get(5)?;
            Ok(RunHistoryEntry {
                id: row.get(0)?,
                target_location: row.get(1)?,
                status: status_str.parse().unwrap_or(RunStatus::Failed),
                error_message: row.get(3)?,
                started_at: parse_ts(&started_str).unwrap_or_else(Utc::now),
                completed_at: completed_str.as_deref().and_then(parse_ts),
                lead_count: row.get(6)?,
                failed_sources: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DomainError::from)
    }
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl SessionReporter for SqliteSessionLog {
    async fn report_run_started(&self, run_id: &str, target_location: &str) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR IGNORE INTO run_sessions (id, target_location, status, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                run_id,
                target_location,
                RunStatus::Running.to_string(),
                self.now_rfc3339()
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to record run start: {e}")))?;
        Ok(())
    }

    async fn report_source_outcome(&self, run_id: &str, outcome: &SourceOutcome) -> Result<(), DomainError> {
        let status = if outcome.timed_out {
            "timeout".to_string()
        } else {
            outcome.status.to_string()
        };
        self.append_event(
            run_id,
            "source",
            &outcome.source,
            &status,
            outcome.count,
            outcome.error_message.as_deref(),
        )
    }

    async fn report_run_outcome(
        &self,
        run_id: &str,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> Result<(), DomainError> {
        self.append_event(run_id, "run", "", &status.to_string(), 0, error_message)?;
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "UPDATE run_sessions SET status = ?1, error_message = ?2, completed_at = ?3
             WHERE id = ?4 AND status = 'running'",
            params![status.to_string(), error_message, self.now_rfc3339(), run_id],
        )
        .map_err(|e| DomainError::Database(format!("Failed to record run outcome: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::clock::FixedClock;
    use crate::domain::values::run_status::OutcomeStatus;
    use chrono::TimeZone;
    use crate::infrastructure::sqlite::migrations::run_migrations;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
    }

    fn log() -> SqliteSessionLog {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        SqliteSessionLog::new(conn, Arc::new(FixedClock(at())))
    }

    fn outcome(source: &str, status: OutcomeStatus, count: usize) -> SourceOutcome {
        SourceOutcome {
            source: source.into(),
            status,
            count,
            fetched: count,
            filtered: 0,
            duplicates: 0,
            rejected: 0,
            timed_out: false,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn test_history_aggregates_source_events() {
        let log = log();
        log.report_run_started("run-1", "Georgia").await.unwrap();
        log.report_source_outcome("run-1", &outcome("Reddit", OutcomeStatus::Success, 4))
            .await
            .unwrap();
        log.report_source_outcome("run-1", &outcome("Quora", OutcomeStatus::Error, 0))
            .await
            .unwrap();
        log.report_run_outcome("run-1", RunStatus::Completed, None)
            .await
            .unwrap();

        let history = log.history(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, RunStatus::Completed);
        assert_eq!(history[0].lead_count, 4);
        assert_eq!(history[0].failed_sources, 1);
        assert!(history[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_repeated_source_report_is_ignored() {
        let log = log();
        log.report_run_started("run-1", "Georgia").await.unwrap();
        for _ in 0..3 {
            log.report_source_outcome("run-1", &outcome("Reddit", OutcomeStatus::Success, 2))
                .await
                .unwrap();
        }
        assert_eq!(log.history(1).unwrap()[0].lead_count, 2);
    }

    #[tokio::test]
    async fn test_timestamps_follow_injected_clock() {
        let log = log();
        log.report_run_started("run-1", "Georgia").await.unwrap();
        log.report_run_outcome("run-1", RunStatus::Completed, None)
            .await
            .unwrap();

        let entry = &log.history(1).unwrap()[0];
        assert_eq!(entry.started_at, at());
        assert_eq!(entry.completed_at, Some(at()));
    }
}
