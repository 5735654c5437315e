use crate::domain::entities::lead::Lead;
use crate::domain::entities::run_session::{RunSession, SourceOutcome};
use crate::domain::error::DomainError;
use crate::domain::ports::lead_sink::LeadSink;
use crate::domain::ports::session_reporter::SessionReporter;
use crate::domain::values::run_status::RunStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client for the lead dashboard's scraping API.
///
/// The dashboard keeps its own numeric session id, separate from the run id.
/// It is obtained on `report_run_started` (or supplied up front when a job
/// watcher already created the session) and reused for every later call.
pub struct DashboardClient {
    base_url: String,
    api_key: String,
    session_id: Mutex<Option<i64>>,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest<'a> {
    location: &'a str,
    api_key: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    session_id: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionUpdate<'a> {
    session_id: i64,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
    api_key: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogLine<'a> {
    session_id: i64,
    source: &'a str,
    message: String,
    lead_count: usize,
    status: &'a str,
    api_key: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadUpload<'a> {
    session_id: i64,
    lead: &'a Lead,
    api_key: &'a str,
}

impl DashboardClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, resume_session: Option<i64>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            session_id: Mutex::new(resume_session),
            client: reqwest::Client::builder()
                .user_agent("solarleads/0.1")
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn session_id(&self) -> Option<i64> {
        self.session_id.lock().ok().and_then(|g| *g)
    }

    fn set_session_id(&self, id: i64) -> Result<(), DomainError> {
        let mut guard = self
            .session_id
            .lock()
            .map_err(|e| DomainError::Network(e.to_string()))?;
        *guard = Some(id);
        Ok(())
    }

    fn require_session(&self) -> Result<i64, DomainError> {
        self.session_id()
            .ok_or_else(|| DomainError::Network("no dashboard session".into()))
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, DomainError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::Network(format!("{path}: {e}")))?;
        if !resp.status().is_success() {
            return Err(DomainError::Network(format!("{path} returned {}", resp.status())));
        }
        Ok(resp)
    }

    async fn update_session(&self, status: &str, error_message: Option<&str>) -> Result<(), DomainError> {
        let session_id = self.require_session()?;
        let body = SessionUpdate {
            session_id,
            status,
            error_message,
            api_key: &self.api_key,
        };
        self.send(reqwest::Method::PATCH, "/api/scraping/sessions", &body)
            .await?;
        Ok(())
    }
}

fn log_message(outcome: &SourceOutcome) -> String {
    match &outcome.error_message {
        Some(err) => err.clone(),
        None => format!(
            "Found {} leads ({} fetched, {} filtered, {} duplicates)",
            outcome.count, outcome.fetched, outcome.filtered, outcome.duplicates
        ),
    }
}

#[async_trait]
impl SessionReporter for DashboardClient {
    async fn report_run_started(&self, _run_id: &str, target_location: &str) -> Result<(), DomainError> {
        if let Some(id) = self.session_id() {
            self.update_session("running", None).await?;
            info!(session_id = id, "resumed dashboard session");
            return Ok(());
        }

        let body = StartRequest {
            location: target_location,
            api_key: &self.api_key,
        };
        let resp: StartResponse = self
            .send(reqwest::Method::POST, "/api/scraping/start", &body)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Network(format!("bad start response: {e}")))?;

        match (resp.success, resp.session_id) {
            (true, Some(id)) => {
                self.set_session_id(id)?;
                info!(session_id = id, "dashboard session started");
                Ok(())
            }
            _ => Err(DomainError::Network(format!(
                "dashboard refused session: {}",
                resp.error.unwrap_or_else(|| "unknown error".into())
            ))),
        }
    }

    async fn report_source_outcome(&self, _run_id: &str, outcome: &SourceOutcome) -> Result<(), DomainError> {
        let session_id = self.require_session()?;
        let status = if outcome.timed_out {
            "timeout".to_string()
        } else {
            outcome.status.to_string()
        };
        let body = LogLine {
            session_id,
            source: &outcome.source,
            message: log_message(outcome),
            lead_count: outcome.count,
            status: &status,
            api_key: &self.api_key,
        };
        self.send(reqwest::Method::POST, "/api/scraping/logs", &body)
            .await?;
        debug!(source = %outcome.source, "posted dashboard log");
        Ok(())
    }

    async fn report_run_outcome(
        &self,
        _run_id: &str,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> Result<(), DomainError> {
        self.update_session(&status.to_string(), error_message).await
    }
}

#[async_trait]
impl LeadSink for DashboardClient {
    fn name(&self) -> &str {
        "dashboard"
    }

    /// Uploads leads one by one. A failed upload is logged and skipped.
    async fn publish(&self, session: &RunSession) -> Result<String, DomainError> {
        let session_id = self.require_session()?;
        let mut sent = 0usize;
        for lead in session.leads() {
            let body = LeadUpload {
                session_id,
                lead,
                api_key: &self.api_key,
            };
            match self
                .send(reqwest::Method::POST, "/api/scraping/leads", &body)
                .await
            {
                Ok(_) => sent += 1,
                Err(e) => warn!(name = %lead.name, error = %e, "lead upload failed"),
            }
        }
        Ok(format!("{sent}/{} leads to {}", session.leads().len(), self.base_url))
    }
}
