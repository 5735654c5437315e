//! Shared test helpers: scripted collectors and a recording reporter.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use solarleads::application::run_coordinator::{RunCoordinator, RunSettings};
use solarleads::domain::entities::run_session::SourceOutcome;
use solarleads::domain::error::DomainError;
use solarleads::domain::ports::clock::FixedClock;
use solarleads::domain::ports::lock_store::LockStore;
use solarleads::domain::ports::session_reporter::SessionReporter;
use solarleads::domain::ports::source_collector::{CollectorError, SourceCollector};
use solarleads::domain::values::raw_candidate::RawCandidate;
use solarleads::domain::values::run_status::RunStatus;
use solarleads::domain::values::source_kind::SourceKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 15, 0, 0).unwrap()
}

/// A Reddit-style raw post that passes the classifier as a repair request.
pub fn repair_post(author: &str, post_url: &str) -> Value {
    json!({
        "author": author,
        "title": "Solar panels stopped working",
        "selftext": "Our inverter shows a fault since the storm. Need someone to fix it.",
        "postUrl": post_url,
        "timestamp": (now() - chrono::Duration::hours(3)).to_rfc3339(),
    })
}

pub enum Behavior {
    Records(Vec<Value>),
    Fail(String),
    Panic,
    Sleep(Duration),
}

/// Collector whose behavior is fixed up front. Counts invocations.
pub struct ScriptedCollector {
    pub name: String,
    pub kind: SourceKind,
    pub behavior: Behavior,
    pub calls: AtomicUsize,
}

impl ScriptedCollector {
    pub fn new(name: &str, kind: SourceKind, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn returning(name: &str, kind: SourceKind, records: Vec<Value>) -> Arc<Self> {
        Self::new(name, kind, Behavior::Records(records))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceCollector for ScriptedCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn collect(&self, _location: &str) -> Result<Vec<RawCandidate>, CollectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Records(records) => Ok(records.iter().cloned().map(RawCandidate::new).collect()),
            Behavior::Fail(msg) => Err(CollectorError::Network(msg.clone())),
            Behavior::Panic => panic!("collector blew up"),
            Behavior::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok(vec![])
            }
        }
    }
}

/// Records every reporter call as a short string, in call order.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
    pub outcomes: Mutex<Vec<SourceOutcome>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<SourceOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionReporter for RecordingReporter {
    async fn report_run_started(&self, _run_id: &str, target_location: &str) -> Result<(), DomainError> {
        self.events.lock().unwrap().push(format!("started:{target_location}"));
        Ok(())
    }

    async fn report_source_outcome(&self, _run_id: &str, outcome: &SourceOutcome) -> Result<(), DomainError> {
        self.events
            .lock()
            .unwrap()
            .push(format!("source:{}:{}", outcome.source, outcome.status));
        self.outcomes.lock().unwrap().push(outcome.clone());
        Ok(())
    }

    async fn report_run_outcome(
        &self,
        _run_id: &str,
        status: RunStatus,
        _error_message: Option<&str>,
    ) -> Result<(), DomainError> {
        self.events.lock().unwrap().push(format!("run:{status}"));
        Ok(())
    }
}

/// Fails every call.
pub struct FailingReporter;

#[async_trait]
impl SessionReporter for FailingReporter {
    async fn report_run_started(&self, _run_id: &str, _target_location: &str) -> Result<(), DomainError> {
        Err(DomainError::Network("dashboard unreachable".into()))
    }

    async fn report_source_outcome(&self, _run_id: &str, _outcome: &SourceOutcome) -> Result<(), DomainError> {
        Err(DomainError::Network("dashboard unreachable".into()))
    }

    async fn report_run_outcome(
        &self,
        _run_id: &str,
        _status: RunStatus,
        _error_message: Option<&str>,
    ) -> Result<(), DomainError> {
        Err(DomainError::Network("dashboard unreachable".into()))
    }
}

/// Sleeps for the given duration on every call.
pub struct StalledReporter(pub Duration);

#[async_trait]
impl SessionReporter for StalledReporter {
    async fn report_run_started(&self, _run_id: &str, _target_location: &str) -> Result<(), DomainError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }

    async fn report_source_outcome(&self, _run_id: &str, _outcome: &SourceOutcome) -> Result<(), DomainError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }

    async fn report_run_outcome(
        &self,
        _run_id: &str,
        _status: RunStatus,
        _error_message: Option<&str>,
    ) -> Result<(), DomainError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

pub fn coordinator(
    lock_store: Arc<dyn LockStore>,
    reporter: Arc<dyn SessionReporter>,
    source_timeout: Duration,
) -> RunCoordinator {
    RunCoordinator::new(
        lock_store,
        reporter,
        Arc::new(FixedClock(now())),
        RunSettings {
            source_timeout,
            ..RunSettings::default()
        },
    )
}

pub fn sources(list: &[Arc<ScriptedCollector>]) -> Vec<Arc<dyn SourceCollector>> {
    list.iter()
        .map(|c| Arc::clone(c) as Arc<dyn SourceCollector>)
        .collect()
}
