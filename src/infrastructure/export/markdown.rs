use super::write_file;
use crate::application::summarize::RunSummary;
use crate::domain::entities::run_session::RunSession;
use crate::domain::error::DomainError;
use crate::domain::ports::lead_sink::LeadSink;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Writes `DAILY-LEAD-REPORT-<date>.md` for a run.
pub struct ReportWriter {
    output_dir: PathBuf,
    top_n: usize,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, top_n: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            top_n,
        }
    }

    pub fn file_name(session: &RunSession) -> String {
        format!("DAILY-LEAD-REPORT-{}.md", session.started_at.format("%Y-%m-%d"))
    }

    pub fn render(&self, session: &RunSession) -> String {
        RunSummary::from_session(session, self.top_n).to_markdown()
    }

    pub fn write(&self, session: &RunSession) -> Result<PathBuf, DomainError> {
        let path = write_file(&self.output_dir, &Self::file_name(session), &self.render(session))?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }
}

#[async_trait]
impl LeadSink for ReportWriter {
    fn name(&self) -> &str {
        "report"
    }

    async fn publish(&self, session: &RunSession) -> Result<String, DomainError> {
        Ok(self.write(session)?.display().to_string())
    }
}
