pub mod dashboard;

use crate::domain::entities::run_session::SourceOutcome;
use crate::domain::error::DomainError;
use crate::domain::ports::session_reporter::SessionReporter;
use crate::domain::values::run_status::RunStatus;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Writes run progress to the tracing log. Always available.
pub struct LogReporter;

#[async_trait]
impl SessionReporter for LogReporter {
    async fn report_run_started(&self, run_id: &str, target_location: &str) -> Result<(), DomainError> {
        info!(run_id, target_location, "run started");
        Ok(())
    }

    async fn report_source_outcome(&self, run_id: &str, outcome: &SourceOutcome) -> Result<(), DomainError> {
        if outcome.is_error() {
            warn!(
                run_id,
                source = %outcome.source,
                timed_out = outcome.timed_out,
                error = outcome.error_message.as_deref().unwrap_or(""),
                "source failed"
            );
        } else {
            info!(
                run_id,
                source = %outcome.source,
                count = outcome.count,
                fetched = outcome.fetched,
                filtered = outcome.filtered,
                duplicates = outcome.duplicates,
                rejected = outcome.rejected,
                "source finished"
            );
        }
        Ok(())
    }

    async fn report_run_outcome(
        &self,
        run_id: &str,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> Result<(), DomainError> {
        match error_message {
            Some(msg) => warn!(run_id, %status, error = msg, "run finished"),
            None => info!(run_id, %status, "run finished"),
        }
        Ok(())
    }
}

/// Forwards every call to each inner reporter in order. One failing reporter
/// does not stop the others; the first error is returned.
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn SessionReporter>>,
}

impl FanoutReporter {
    pub fn new(reporters: Vec<Arc<dyn SessionReporter>>) -> Self {
        Self { reporters }
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

fn keep_first(first: &mut Option<DomainError>, result: Result<(), DomainError>) {
    if let Err(e) = result {
        if first.is_none() {
            *first = Some(e);
        }
    }
}

#[async_trait]
impl SessionReporter for FanoutReporter {
    async fn report_run_started(&self, run_id: &str, target_location: &str) -> Result<(), DomainError> {
        let mut first = None;
        for r in &self.reporters {
            keep_first(&mut first, r.report_run_started(run_id, target_location).await);
        }
        first.map_or(Ok(()), Err)
    }

    async fn report_source_outcome(&self, run_id: &str, outcome: &SourceOutcome) -> Result<(), DomainError> {
        let mut first = None;
        for r in &self.reporters {
            keep_first(&mut first, r.report_source_outcome(run_id, outcome).await);
        }
        first.map_or(Ok(()), Err)
    }

    async fn report_run_outcome(
        &self,
        run_id: &str,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut first = None;
        for r in &self.reporters {
            keep_first(&mut first, r.report_run_outcome(run_id, status, error_message).await);
        }
        first.map_or(Ok(()), Err)
    }
}
