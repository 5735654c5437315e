use crate::domain::entities::run_session::SourceOutcome;
use crate::domain::error::DomainError;
use crate::domain::values::run_status::RunStatus;
use async_trait::async_trait;

/// Progress sink for a run. Calls are best-effort: the coordinator logs a
/// failed report and moves on.
///
/// Per run, `report_source_outcome` is called at most once per source, in
/// invocation order, and `report_run_outcome` exactly once, last.
#[async_trait]
pub trait SessionReporter: Send + Sync {
    async fn report_run_started(&self, _run_id: &str, _target_location: &str) -> Result<(), DomainError> {
        Ok(())
    }

    async fn report_source_outcome(&self, run_id: &str, outcome: &SourceOutcome) -> Result<(), DomainError>;

    async fn report_run_outcome(
        &self,
        run_id: &str,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> Result<(), DomainError>;
}
