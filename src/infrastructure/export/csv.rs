use super::{output_file_name, write_file};
use crate::domain::entities::lead::Lead;
use crate::domain::entities::run_session::RunSession;
use crate::domain::error::DomainError;
use crate::domain::ports::lead_sink::LeadSink;
use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::info;

pub const HEADERS: [&str; 15] = [
    "Priority",
    "Score",
    "Source",
    "Name",
    "Location",
    "Address",
    "System Size",
    "Permit Number",
    "Message",
    "Profile URL",
    "Post URL",
    "Timestamp",
    "Intent",
    "Phone",
    "Email",
];

/// Flat CSV export of a run's leads, one row per lead in run order.
pub struct CsvExporter {
    output_dir: PathBuf,
    prefix: String,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn render(&self, leads: &[Lead]) -> String {
        let mut lines = Vec::with_capacity(leads.len() + 1);
        lines.push(HEADERS.join(","));
        for lead in leads {
            let fields = [
                lead.priority.to_string(),
                lead.score.to_string(),
                lead.source.clone(),
                lead.name.clone(),
                lead.location.clone(),
                lead.address.clone(),
                lead.system_size.clone(),
                lead.permit_number.clone(),
                lead.message.clone(),
                lead.profile_url.clone(),
                lead.post_url.clone(),
                lead.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                lead.intent.to_string(),
                lead.phone.clone(),
                lead.email.clone(),
            ];
            let row: Vec<Cow<'_, str>> = fields.iter().map(|f| escape(f)).collect();
            lines.push(row.join(","));
        }
        lines.join("\n")
    }

    pub fn write(&self, leads: &[Lead], date: NaiveDate) -> Result<PathBuf, DomainError> {
        let path = write_file(
            &self.output_dir,
            &output_file_name(&self.prefix, date),
            &self.render(leads),
        )?;
        info!(path = %path.display(), count = leads.len(), "csv written");
        Ok(path)
    }
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[async_trait]
impl LeadSink for CsvExporter {
    fn name(&self) -> &str {
        "csv"
    }

    async fn publish(&self, session: &RunSession) -> Result<String, DomainError> {
        let path = self.write(session.leads(), session.started_at.date_naive())?;
        Ok(path.display().to_string())
    }
}
