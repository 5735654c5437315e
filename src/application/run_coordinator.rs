//! Run orchestration: lock, invoke every source in priority order, merge
//! each batch as it arrives, finalize.
//!
//! A source that errors, panics or times out contributes nothing and the run
//! continues. Only lock acquisition and finalization failures reach the
//! caller, and the lock is released before either is returned.

use crate::application::classify::IntentClassifier;
use crate::application::dedup::Deduplicator;
use crate::application::normalize::RecordNormalizer;
use crate::application::scoring::ScoringEngine;
use crate::domain::entities::run_session::{RunSession, SourceOutcome};
use crate::domain::error::{DomainError, SourceError};
use crate::domain::ports::clock::Clock;
use crate::domain::ports::lock_store::{LockStore, RunLockRecord};
use crate::domain::ports::session_reporter::SessionReporter;
use crate::domain::ports::source_collector::SourceCollector;
use crate::domain::values::raw_candidate::RawCandidate;
use crate::domain::values::run_status::{OutcomeStatus, RunStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};

#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub source_timeout: Duration,
    pub lock_stale_after: chrono::Duration,
    /// Upper bound on a single reporter call.
    pub report_timeout: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_secs(45),
            lock_stale_after: chrono::Duration::minutes(10),
            report_timeout: Duration::from_secs(10),
        }
    }
}

/// Holds the run lock; releases it when dropped unless released explicitly.
pub struct RunLockGuard {
    store: Arc<dyn LockStore>,
    released: bool,
}

impl RunLockGuard {
    pub fn acquire(
        store: Arc<dyn LockStore>,
        record: &RunLockRecord,
        stale_after: chrono::Duration,
    ) -> Result<Self, DomainError> {
        if let Some(stale) = store.acquire(record, stale_after)? {
            warn!(
                held_since = %stale.timestamp,
                held_by = stale.process_id,
                "overriding stale run lock"
            );
        }
        Ok(Self {
            store,
            released: false,
        })
    }

    pub fn release(mut self) -> Result<(), DomainError> {
        self.released = true;
        self.store.release()
    }
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.store.release() {
                warn!(error = %e, "failed to release run lock on unwind");
            }
        }
    }
}

pub struct RunCoordinator {
    lock_store: Arc<dyn LockStore>,
    reporter: Arc<dyn SessionReporter>,
    clock: Arc<dyn Clock>,
    settings: RunSettings,
    classifier: IntentClassifier,
    scorer: ScoringEngine,
}

impl RunCoordinator {
    pub fn new(
        lock_store: Arc<dyn LockStore>,
        reporter: Arc<dyn SessionReporter>,
        clock: Arc<dyn Clock>,
        settings: RunSettings,
    ) -> Self {
        Self {
            lock_store,
            reporter,
            clock,
            settings,
            classifier: IntentClassifier::new(),
            scorer: ScoringEngine::new(),
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run every source once for `target_location`.
    ///
    /// Fails with [`DomainError::ConcurrentRun`] without invoking anything if
    /// a fresh lock is held.
    pub async fn run_once(
        &self,
        target_location: &str,
        sources: &[Arc<dyn SourceCollector>],
    ) -> Result<RunSession, DomainError> {
        let target_location = target_location.trim();
        if target_location.is_empty() {
            return Err(DomainError::InvalidInput("target location is empty".into()));
        }
        if sources.is_empty() {
            return Err(DomainError::InvalidInput("no sources configured".into()));
        }

        let started_at = self.clock.now();
        let guard = RunLockGuard::acquire(
            Arc::clone(&self.lock_store),
            &RunLockRecord::new(target_location, started_at),
            self.settings.lock_stale_after,
        )?;

        let mut session = RunSession::start(target_location, started_at);
        let span = info_span!("run", run_id = %session.id, target_location);

        async move {
            info!(sources = sources.len(), "run started");
            self.best_effort("run_started", self.reporter.report_run_started(&session.id, target_location))
                .await;

            let merged = self.run_sources(&mut session, sources).await;
            let finalized = self.finalize(&mut session, merged);
            let released = guard
                .release()
                .map_err(|e| DomainError::RunFinalization(format!("failed to release run lock: {e}")));

            self.best_effort(
                "run_outcome",
                self.reporter
                    .report_run_outcome(&session.id, session.status(), session.error_message()),
            )
            .await;

            finalized?;
            released?;

            info!(
                status = %session.status(),
                leads = session.leads().len(),
                "run finished"
            );
            Ok(session)
        }
        .instrument(span)
        .await
    }

    async fn run_sources(
        &self,
        session: &mut RunSession,
        sources: &[Arc<dyn SourceCollector>],
    ) -> Result<(), DomainError> {
        let mut ordered: Vec<&Arc<dyn SourceCollector>> = sources.iter().collect();
        ordered.sort_by_key(|s| s.kind().rank());

        let mut dedup = Deduplicator::new();
        let mut used = HashSet::new();
        for source in ordered {
            let name = outcome_key(&mut used, source.name());
            if name != source.name() {
                warn!(source = source.name(), outcome_key = %name, "duplicate source name");
            }
            let result = self.invoke(source, &session.target_location).await;
            let outcome = match result {
                Ok(batch) => self.merge_batch(session, &mut dedup, source.as_ref(), &name, batch)?,
                Err(e) => {
                    warn!(source = %name, error = %e, "source failed");
                    SourceOutcome::failed(&name, &e)
                }
            };

            if session.record_outcome(outcome.clone()) {
                info!(
                    source = %name,
                    status = %outcome.status,
                    count = outcome.count,
                    fetched = outcome.fetched,
                    filtered = outcome.filtered,
                    duplicates = outcome.duplicates,
                    "source finished"
                );
                self.best_effort("source_outcome", self.reporter.report_source_outcome(&session.id, &outcome))
                    .await;
            } else {
                warn!(source = %name, "outcome already recorded");
            }
        }
        Ok(())
    }

    /// Run one collector on its own task, bounded by the source timeout.
    ///
    /// On timeout the task is detached, not aborted: the run stops waiting
    /// for it but does not guarantee its side effects stop.
    async fn invoke(
        &self,
        source: &Arc<dyn SourceCollector>,
        location: &str,
    ) -> Result<Vec<RawCandidate>, SourceError> {
        let source_name = source.name().to_string();
        let collector = Arc::clone(source);
        let location = location.to_string();
        let handle = tokio::spawn(async move { collector.collect(&location).await });

        match tokio::time::timeout(self.settings.source_timeout, handle).await {
            Err(_) => Err(SourceError::Timeout {
                source_name,
                after: self.settings.source_timeout,
            }),
            Ok(Err(join_err)) => Err(SourceError::Execution {
                source_name,
                message: if join_err.is_panic() {
                    "collector panicked".to_string()
                } else {
                    join_err.to_string()
                },
            }),
            Ok(Ok(Err(e))) => Err(SourceError::Execution {
                source_name,
                message: e.to_string(),
            }),
            Ok(Ok(Ok(batch))) => Ok(batch),
        }
    }

    /// normalize, classify, score, dedup, append; in batch order.
    fn merge_batch(
        &self,
        session: &mut RunSession,
        dedup: &mut Deduplicator,
        source: &dyn SourceCollector,
        outcome_key: &str,
        batch: Vec<RawCandidate>,
    ) -> Result<SourceOutcome, DomainError> {
        let now = self.clock.now();
        let normalizer = RecordNormalizer::new(source.name(), source.kind());
        let mut outcome = SourceOutcome {
            source: outcome_key.to_string(),
            status: OutcomeStatus::Success,
            count: 0,
            fetched: batch.len(),
            filtered: 0,
            duplicates: 0,
            rejected: 0,
            timed_out: false,
            error_message: None,
        };

        for raw in &batch {
            let partial = match normalizer.normalize(raw, &session.target_location, now) {
                Ok(p) => p,
                Err(e) => {
                    warn!(source = %outcome.source, error = %e, "rejected malformed record");
                    outcome.rejected += 1;
                    continue;
                }
            };

            let classification = self.classifier.classify_for(partial.source_kind, &partial.message);
            let Some(intent) = classification.accepted_intent() else {
                outcome.filtered += 1;
                continue;
            };

            let score = self.scorer.score(&partial, &classification, now);
            if !dedup.check_and_add(Deduplicator::key_for(&partial)) {
                outcome.duplicates += 1;
                continue;
            }

            session.push_lead(partial.into_lead(intent, score))?;
            outcome.count += 1;
        }

        Ok(outcome)
    }

    fn finalize(&self, session: &mut RunSession, merged: Result<(), DomainError>) -> Result<(), DomainError> {
        session.sort_leads();

        // Source failures never fail the run; they only leave a note.
        let (status, error_message) = match &merged {
            Err(e) => (RunStatus::Failed, Some(e.to_string())),
            Ok(()) if session.all_sources_failed() => (
                RunStatus::Completed,
                Some(format!("all {} sources failed", session.outcomes().len())),
            ),
            Ok(()) => (RunStatus::Completed, None),
        };
        session.finish(status, error_message, self.clock.now())?;

        merged.map_err(|e| match e {
            DomainError::RunFinalization(_) => e,
            other => DomainError::RunFinalization(other.to_string()),
        })
    }

    async fn best_effort<F>(&self, what: &'static str, fut: F)
    where
        F: std::future::Future<Output = Result<(), DomainError>>,
    {
        match tokio::time::timeout(self.settings.report_timeout, fut).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(report = what, error = %e, "session report failed"),
            Err(_) => warn!(report = what, "session report timed out"),
        }
    }
}

/// Outcome key for a collector: its name, or the first free `name#n` when
/// another collector in this run already claimed that name.
fn outcome_key(used: &mut HashSet<String>, name: &str) -> String {
    let mut key = name.to_string();
    let mut n = 1;
    while used.contains(&key) {
        n += 1;
        key = format!("{name}#{n}");
    }
    used.insert(key.clone());
    key
}
