use crate::domain::entities::lead::Lead;
use crate::domain::error::{DomainError, SourceError};
use crate::domain::values::priority::Priority;
use crate::domain::values::run_status::{OutcomeStatus, RunStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one source contributed to a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub status: OutcomeStatus,
    /// Leads that made it into the run's result set.
    pub count: usize,
    /// Raw records the source returned.
    pub fetched: usize,
    /// Records dropped by the classifier (off-topic, ads, no request).
    pub filtered: usize,
    pub duplicates: usize,
    /// Records rejected as malformed.
    pub rejected: usize,
    pub timed_out: bool,
    pub error_message: Option<String>,
}

impl SourceOutcome {
    pub fn failed(source: &str, err: &SourceError) -> Self {
        Self {
            source: source.to_string(),
            status: OutcomeStatus::Error,
            count: 0,
            fetched: 0,
            filtered: 0,
            duplicates: 0,
            rejected: 0,
            timed_out: err.is_timeout(),
            error_message: Some(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }
}

/// One aggregation run over a fixed list of sources.
#[derive(Debug, Clone, Serialize)]
pub struct RunSession {
    pub id: String,
    pub target_location: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    status: RunStatus,
    error_message: Option<String>,
    leads: Vec<Lead>,
    per_source_outcome: Vec<SourceOutcome>,
}

impl RunSession {
    pub fn start(target_location: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            target_location: target_location.to_string(),
            started_at,
            completed_at: None,
            status: RunStatus::Running,
            error_message: None,
            leads: Vec::new(),
            per_source_outcome: Vec::new(),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn outcomes(&self) -> &[SourceOutcome] {
        &self.per_source_outcome
    }

    pub fn outcome(&self, source: &str) -> Option<&SourceOutcome> {
        self.per_source_outcome.iter().find(|o| o.source == source)
    }

    /// Append a lead. Only valid while the run is in progress.
    pub fn push_lead(&mut self, lead: Lead) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::RunFinalization(format!(
                "cannot add leads to a {} run",
                self.status
            )));
        }
        self.leads.push(lead);
        Ok(())
    }

    /// Record a source's outcome. Returns `false` without touching state if
    /// that source already has an entry.
    pub fn record_outcome(&mut self, outcome: SourceOutcome) -> bool {
        if self.outcome(&outcome.source).is_some() {
            return false;
        }
        self.per_source_outcome.push(outcome);
        true
    }

    /// True when at least one source ran and every one of them errored.
    pub fn all_sources_failed(&self) -> bool {
        !self.per_source_outcome.is_empty() && self.per_source_outcome.iter().all(|o| o.is_error())
    }

    /// Stable sort by score, descending. Ties keep insertion order.
    pub fn sort_leads(&mut self) {
        self.leads.sort_by(|a, b| b.score.cmp(&a.score));
    }

    pub fn finish(
        &mut self,
        status: RunStatus,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(status) {
            return Err(DomainError::RunFinalization(format!(
                "invalid run status transition {} -> {}",
                self.status, status
            )));
        }
        self.status = status;
        self.error_message = error_message;
        self.completed_at = Some(at);
        Ok(())
    }

    pub fn count_by_priority(&self, priority: Priority) -> usize {
        self.leads.iter().filter(|l| l.priority == priority).count()
    }
}
