pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::run_coordinator::{RunCoordinator, RunSettings};
use crate::config::{AppConfig, LockBackend};
use crate::domain::entities::run_session::RunSession;
use crate::domain::error::DomainError;
use crate::domain::ports::clock::{Clock, SystemClock};
use crate::domain::ports::lead_sink::LeadSink;
use crate::domain::ports::lock_store::{LockStore, RunLockRecord};
use crate::domain::ports::session_reporter::SessionReporter;
use crate::domain::ports::source_collector::SourceCollector;
use crate::infrastructure::collectors::records_file::RecordsFileCollector;
use crate::infrastructure::collectors::reddit::RedditCollector;
use crate::infrastructure::export::csv::CsvExporter;
use crate::infrastructure::export::markdown::ReportWriter;
use crate::infrastructure::lock::file::FileLockStore;
use crate::infrastructure::reporters::dashboard::DashboardClient;
use crate::infrastructure::reporters::{FanoutReporter, LogReporter};
use crate::infrastructure::sqlite::lock_store::SqliteLockStore;
use crate::infrastructure::sqlite::open_database;
use crate::infrastructure::sqlite::session_log::{RunHistoryEntry, SqliteSessionLog};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Result of handing a run to one sink.
#[derive(Debug)]
pub struct ExportResult {
    pub sink: String,
    pub result: Result<String, DomainError>,
}

/// The current lock marker and whether it would be overridden now.
#[derive(Debug, Clone, Serialize)]
pub struct LockStatus {
    pub record: RunLockRecord,
    pub stale: bool,
}

pub struct SolarLeads {
    config: AppConfig,
    coordinator: RunCoordinator,
    lock_store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    sinks: Vec<Arc<dyn LeadSink>>,
    session_log: Option<Arc<SqliteSessionLog>>,
}

impl SolarLeads {
    /// Wire the production adapters from `config`.
    pub fn new(config: AppConfig) -> Result<Self, DomainError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let session_log = Arc::new(SqliteSessionLog::new(
            open_database(&config.db_path)?,
            clock.clone(),
        ));

        let lock_store: Arc<dyn LockStore> = match config.lock_backend {
            LockBackend::File => Arc::new(FileLockStore::new(config.lock_path.clone())),
            LockBackend::Sqlite => Arc::new(SqliteLockStore::new(open_database(&config.db_path)?)),
        };

        let mut reporters: Vec<Arc<dyn SessionReporter>> = vec![
            Arc::new(LogReporter) as Arc<dyn SessionReporter>,
            session_log.clone(),
        ];
        let mut sinks: Vec<Arc<dyn LeadSink>> = vec![
            Arc::new(CsvExporter::new(config.output_dir.clone(), config.csv_prefix.clone()))
                as Arc<dyn LeadSink>,
            Arc::new(ReportWriter::new(config.output_dir.clone(), config.report_top_n)),
        ];
        if let Some(dash) = &config.dashboard {
            let client = Arc::new(DashboardClient::new(
                dash.api_url.clone(),
                dash.api_key.clone(),
                dash.resume_session,
            ));
            reporters.push(client.clone());
            sinks.push(client);
        }

        Ok(Self::with_ports(
            config,
            lock_store,
            Arc::new(FanoutReporter::new(reporters)),
            clock,
            sinks,
            Some(session_log),
        ))
    }

    /// Assemble from explicit ports. Used by tests and embedders.
    pub fn with_ports(
        config: AppConfig,
        lock_store: Arc<dyn LockStore>,
        reporter: Arc<dyn SessionReporter>,
        clock: Arc<dyn Clock>,
        sinks: Vec<Arc<dyn LeadSink>>,
        session_log: Option<Arc<SqliteSessionLog>>,
    ) -> Self {
        let settings = RunSettings {
            source_timeout: config.source_timeout,
            lock_stale_after: config.lock_stale_after,
            ..RunSettings::default()
        };
        let coordinator = RunCoordinator::new(lock_store.clone(), reporter, clock.clone(), settings);
        Self {
            config,
            coordinator,
            lock_store,
            clock,
            sinks,
            session_log,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run every source once. `None` uses the configured default location.
    pub async fn run(
        &self,
        location: Option<&str>,
        sources: &[Arc<dyn SourceCollector>],
    ) -> Result<RunSession, DomainError> {
        let location = location.unwrap_or(&self.config.default_location);
        self.coordinator.run_once(location, sources).await
    }

    /// Hand a finished run to every sink. A failing sink is logged and the
    /// rest still run.
    pub async fn export(&self, session: &RunSession) -> Vec<ExportResult> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let result = sink.publish(session).await;
            if let Err(e) = &result {
                warn!(sink = sink.name(), error = %e, "export failed");
            }
            results.push(ExportResult {
                sink: sink.name().to_string(),
                result,
            });
        }
        results
    }

    pub fn history(&self, limit: usize) -> Result<Vec<RunHistoryEntry>, DomainError> {
        match &self.session_log {
            Some(log) => log.history(limit),
            None => Err(DomainError::Config("session log is not configured".into())),
        }
    }

    pub fn lock_status(&self) -> Result<Option<LockStatus>, DomainError> {
        let now = self.clock.now();
        Ok(self.lock_store.read()?.map(|record| LockStatus {
            stale: self
                .lock_store
                .is_stale(&record, now, self.config.lock_stale_after),
            record,
        }))
    }

    /// The stock source list: the given record files, then Reddit unless
    /// disabled. Ordering by kind happens inside the run.
    pub fn default_sources(
        &self,
        records: Vec<RecordsFileCollector>,
        include_reddit: bool,
    ) -> Vec<Arc<dyn SourceCollector>> {
        let mut sources: Vec<Arc<dyn SourceCollector>> = records
            .into_iter()
            .map(|c| Arc::new(c) as Arc<dyn SourceCollector>)
            .collect();
        if include_reddit {
            sources.push(Arc::new(RedditCollector::new(self.config.reddit_query_delay)));
        }
        sources
    }
}
