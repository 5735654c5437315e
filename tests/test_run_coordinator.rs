mod common;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use common::{
    coordinator, now, repair_post, sources, Behavior, FailingReporter, RecordingReporter, ScriptedCollector,
    StalledReporter,
};
use serde_json::json;
use solarleads::application::run_coordinator::{RunCoordinator, RunSettings};
use solarleads::domain::entities::run_session::RunSession;
use solarleads::domain::error::DomainError;
use solarleads::domain::ports::clock::FixedClock;
use solarleads::domain::ports::lock_store::{LockStore, RunLockRecord};
use solarleads::domain::ports::session_reporter::SessionReporter;
use solarleads::domain::ports::source_collector::{CollectorError, SourceCollector};
use solarleads::domain::values::intent::Intent;
use solarleads::domain::values::priority::Priority;
use solarleads::domain::values::raw_candidate::RawCandidate;
use solarleads::domain::values::run_status::{OutcomeStatus, RunStatus};
use solarleads::domain::values::source_kind::SourceKind;
use solarleads::infrastructure::lock::memory::InMemoryLockStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_failing_source_is_isolated() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock.clone(), reporter.clone(), TIMEOUT);

    let first = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![repair_post("sunny", "https://reddit.com/r/solar/1")],
    );
    let second = ScriptedCollector::new("Quora", SourceKind::Social, Behavior::Fail("503 from upstream".into()));
    let third = ScriptedCollector::returning(
        "Nextdoor",
        SourceKind::Social,
        vec![repair_post("neighbor", "https://nextdoor.com/p/9")],
    );

    let session = coord
        .run_once("Georgia", &sources(&[first.clone(), second.clone(), third.clone()]))
        .await
        .unwrap();

    assert_eq!(session.status(), RunStatus::Completed);
    assert_eq!(session.leads().len(), 2);
    assert_eq!(third.calls(), 1);

    let failed = session.outcome("Quora").unwrap();
    assert_eq!(failed.status, OutcomeStatus::Error);
    assert!(failed.error_message.as_deref().unwrap().contains("503 from upstream"));
    assert_eq!(session.outcome("Reddit").unwrap().count, 1);
    assert_eq!(session.outcome("Nextdoor").unwrap().count, 1);

    assert_eq!(
        reporter.events(),
        vec![
            "started:Georgia",
            "source:Reddit:success",
            "source:Quora:error",
            "source:Nextdoor:success",
            "run:completed",
        ]
    );
    assert!(lock.read().unwrap().is_none(), "lock must be released");
}

#[tokio::test]
async fn test_fresh_lock_blocks_run() {
    let held = RunLockRecord::new("Florida", now() - ChronoDuration::minutes(3));
    let lock = Arc::new(InMemoryLockStore::holding(held.clone()));
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock.clone(), reporter.clone(), TIMEOUT);
    let source = ScriptedCollector::returning("Reddit", SourceKind::Social, vec![]);

    let err = coord
        .run_once("Georgia", &sources(&[source.clone()]))
        .await
        .unwrap_err();

    match err {
        DomainError::ConcurrentRun { target_location, .. } => assert_eq!(target_location, "Florida"),
        other => panic!("expected ConcurrentRun, got {other:?}"),
    }
    assert_eq!(source.calls(), 0);
    assert!(reporter.events().is_empty());
    assert_eq!(lock.read().unwrap(), Some(held));
}

/// Reads the lock while the run is in flight.
struct LockProbe {
    store: Arc<InMemoryLockStore>,
    seen: Mutex<Option<RunLockRecord>>,
}

#[async_trait]
impl SourceCollector for LockProbe {
    fn name(&self) -> &str {
        "Probe"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }

    async fn collect(&self, _location: &str) -> Result<Vec<RawCandidate>, CollectorError> {
        *self.seen.lock().unwrap() = self.store.read().unwrap();
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_stale_lock_is_overridden() {
    let lock = Arc::new(InMemoryLockStore::holding(RunLockRecord::new(
        "Florida",
        now() - ChronoDuration::minutes(11),
    )));
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock.clone(), reporter.clone(), TIMEOUT);
    let probe = Arc::new(LockProbe {
        store: lock.clone(),
        seen: Mutex::new(None),
    });

    let session = coord
        .run_once("Georgia", &[probe.clone() as Arc<dyn SourceCollector>])
        .await
        .unwrap();

    assert_eq!(session.status(), RunStatus::Completed);
    let during = probe.seen.lock().unwrap().clone().unwrap();
    assert_eq!(during.target_location, "Georgia");
    assert_eq!(during.timestamp, now());
    assert!(lock.read().unwrap().is_none());
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock, reporter.clone(), Duration::from_millis(50));

    let slow = ScriptedCollector::new("Perplexity", SourceKind::WebSearch, Behavior::Sleep(Duration::from_secs(30)));
    let fast = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![repair_post("sunny", "https://reddit.com/r/solar/1")],
    );

    let started = std::time::Instant::now();
    let session = coord
        .run_once("Georgia", &sources(&[slow, fast]))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(session.status(), RunStatus::Completed);
    let timed_out = session.outcome("Perplexity").unwrap();
    assert!(timed_out.timed_out);
    assert_eq!(timed_out.status, OutcomeStatus::Error);
    assert_eq!(session.leads().len(), 1);
}

#[tokio::test]
async fn test_panicking_source_is_isolated() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock.clone(), reporter, TIMEOUT);

    let bad = ScriptedCollector::new("Facebook", SourceKind::Social, Behavior::Panic);
    let good = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![repair_post("sunny", "https://reddit.com/r/solar/1")],
    );

    let session = coord.run_once("Georgia", &sources(&[bad, good])).await.unwrap();

    let outcome = session.outcome("Facebook").unwrap();
    assert!(outcome.is_error());
    assert!(!outcome.timed_out);
    assert_eq!(session.leads().len(), 1);
    assert!(lock.read().unwrap().is_none());
}

#[tokio::test]
async fn test_all_sources_failing_still_completes() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock.clone(), reporter.clone(), TIMEOUT);

    let a = ScriptedCollector::new("Reddit", SourceKind::Social, Behavior::Fail("429".into()));
    let b = ScriptedCollector::new("Quora", SourceKind::Social, Behavior::Fail("login wall".into()));

    let session = coord.run_once("Georgia", &sources(&[a, b])).await.unwrap();

    assert_eq!(session.status(), RunStatus::Completed);
    assert_eq!(session.error_message(), Some("all 2 sources failed"));
    assert!(session.leads().is_empty());
    assert!(session.outcomes().iter().all(|o| o.is_error()));
    assert!(session.completed_at.is_some());
    assert_eq!(reporter.events().last().map(String::as_str), Some("run:completed"));
    assert!(lock.read().unwrap().is_none());
}

#[tokio::test]
async fn test_single_failing_permit_source_completes() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock, reporter, TIMEOUT);

    let permits = ScriptedCollector::new("Fulton Permits", SourceKind::Permit, Behavior::Fail("404".into()));
    let session = coord.run_once("Georgia", &sources(&[permits])).await.unwrap();

    assert_eq!(session.status(), RunStatus::Completed);
    assert!(session.outcome("Fulton Permits").unwrap().is_error());
}

#[tokio::test]
async fn test_shared_source_name_gets_its_own_outcome() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock, reporter.clone(), TIMEOUT);

    let first = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![repair_post("sunny", "https://reddit.com/r/solar/1")],
    );
    let second = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![repair_post("rainy", "https://reddit.com/r/solar/2")],
    );

    let session = coord
        .run_once("Georgia", &sources(&[first.clone(), second.clone()]))
        .await
        .unwrap();

    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(session.leads().len(), 2);
    assert_eq!(session.outcomes().len(), 2);
    assert_eq!(session.outcome("Reddit").unwrap().count, 1);
    assert_eq!(session.outcome("Reddit#2").unwrap().count, 1);

    let counted: usize = session.outcomes().iter().map(|o| o.count).sum();
    assert_eq!(counted, session.leads().len());
    assert_eq!(reporter.outcomes().len(), 2);
}

#[tokio::test]
async fn test_sources_run_in_kind_order() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock, reporter.clone(), TIMEOUT);

    let list = [
        ScriptedCollector::returning("Reddit", SourceKind::Social, vec![]),
        ScriptedCollector::returning("Fulton Permits", SourceKind::Permit, vec![]),
        ScriptedCollector::returning("Perplexity", SourceKind::WebSearch, vec![]),
        ScriptedCollector::returning("Quora", SourceKind::Social, vec![]),
        ScriptedCollector::returning("GA Rebates", SourceKind::Incentive, vec![]),
    ];
    coord.run_once("Georgia", &sources(&list)).await.unwrap();

    let order: Vec<String> = reporter.outcomes().into_iter().map(|o| o.source).collect();
    assert_eq!(order, vec!["Fulton Permits", "GA Rebates", "Perplexity", "Reddit", "Quora"]);
}

#[tokio::test]
async fn test_same_post_from_two_sources_kept_once() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock, reporter, TIMEOUT);

    let reddit = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![repair_post("sunny", "https://reddit.com/r/solar/comments/abc/")],
    );
    let web = ScriptedCollector::returning(
        "Web Search",
        SourceKind::Social,
        vec![repair_post("someone-else", "https://www.reddit.com/r/solar/comments/abc")],
    );

    let session = coord.run_once("Georgia", &sources(&[reddit, web])).await.unwrap();

    assert_eq!(session.leads().len(), 1);
    assert_eq!(session.leads()[0].source, "Reddit");
    let web = session.outcome("Web Search").unwrap();
    assert_eq!(web.duplicates, 1);
    assert_eq!(web.count, 0);
    assert_eq!(web.status, OutcomeStatus::Success);
}

#[tokio::test]
async fn test_leads_sorted_by_score_stable() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock, reporter, TIMEOUT);

    let mut low = repair_post("a", "https://reddit.com/r/solar/low");
    low["title"] = json!("Solar panel question");
    low["selftext"] = json!("Is it normal for panels to show an error light?");
    let reddit = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![
            low,
            repair_post("b", "https://reddit.com/r/solar/1"),
            repair_post("c", "https://reddit.com/r/solar/2"),
        ],
    );
    let permits = ScriptedCollector::returning(
        "Fulton Permits",
        SourceKind::Permit,
        vec![json!({
            "name": "J. Carter",
            "address": "12 Peachtree Ln, Atlanta",
            "systemSize": "8.4 kW",
            "permitNumber": "BP-2291",
        })],
    );

    let session = coord
        .run_once("Georgia", &sources(&[reddit, permits]))
        .await
        .unwrap();

    let leads = session.leads();
    assert_eq!(leads.len(), 4);
    assert!(leads.windows(2).all(|w| w[0].score >= w[1].score));

    // Equal scores keep collection order.
    assert_eq!(leads[0].author, "b");
    assert_eq!(leads[1].author, "c");
    assert_eq!(leads[0].score, leads[1].score);

    let permit = &leads[2];
    assert_eq!(permit.source, "Fulton Permits");
    assert_eq!(permit.intent, Intent::Installation);
    assert_eq!(permit.priority, Priority::Hot);
    assert_eq!(permit.score, 110);
    assert_eq!(permit.permit_number, "BP-2291");
    assert_eq!(permit.location, "Georgia");

    assert_eq!(leads[3].author, "a");
    assert_eq!(leads[3].score, 50);
}

#[tokio::test]
async fn test_malformed_and_offtopic_records_are_counted() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock, reporter, TIMEOUT);

    let reddit = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![
            json!("not an object"),
            json!({"author": "astro", "title": "Solar eclipse photos from last night"}),
            json!({"author": "shop", "title": "Solar panel installation, free estimates, call us today"}),
            repair_post("sunny", "https://reddit.com/r/solar/1"),
        ],
    );

    let session = coord.run_once("Georgia", &sources(&[reddit])).await.unwrap();

    let outcome = session.outcome("Reddit").unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.fetched, 4);
    assert_eq!(outcome.rejected, 1);
    assert_eq!(outcome.filtered, 2);
    assert_eq!(outcome.count, 1);
    assert_eq!(session.leads().len(), 1);
}

#[tokio::test]
async fn test_empty_inputs_rejected_before_locking() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock.clone(), reporter.clone(), TIMEOUT);

    let err = coord.run_once("Georgia", &[]).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));

    let source = ScriptedCollector::returning("Reddit", SourceKind::Social, vec![]);
    let err = coord.run_once("   ", &sources(&[source])).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));

    assert!(lock.read().unwrap().is_none());
    assert!(reporter.events().is_empty());
}

#[tokio::test]
async fn test_second_run_after_first_completes() {
    let lock = Arc::new(InMemoryLockStore::new());
    let reporter = Arc::new(RecordingReporter::default());
    let coord = coordinator(lock, reporter, TIMEOUT);
    let source = ScriptedCollector::returning("Reddit", SourceKind::Social, vec![]);

    let first = coord.run_once("Georgia", &sources(&[source.clone()])).await.unwrap();
    let second = coord.run_once("Georgia", &sources(&[source.clone()])).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(source.calls(), 2);
}

async fn run_with_reporter(reporter: Arc<dyn SessionReporter>) -> (RunSession, Arc<InMemoryLockStore>) {
    let lock = Arc::new(InMemoryLockStore::new());
    let coord = RunCoordinator::new(
        lock.clone(),
        reporter,
        Arc::new(FixedClock(now())),
        RunSettings {
            source_timeout: TIMEOUT,
            report_timeout: Duration::from_millis(50),
            ..RunSettings::default()
        },
    );
    let reddit = ScriptedCollector::returning(
        "Reddit",
        SourceKind::Social,
        vec![repair_post("sunny", "https://reddit.com/r/solar/1")],
    );
    let quora = ScriptedCollector::new("Quora", SourceKind::Social, Behavior::Fail("captcha".into()));
    let session = coord.run_once("Georgia", &sources(&[reddit, quora])).await.unwrap();
    (session, lock)
}

#[tokio::test]
async fn test_reporter_errors_do_not_change_run() {
    let (baseline, _) = run_with_reporter(Arc::new(RecordingReporter::default())).await;
    let (session, lock) = run_with_reporter(Arc::new(FailingReporter)).await;

    assert_eq!(session.status(), RunStatus::Completed);
    assert_eq!(session.leads(), baseline.leads());
    assert_eq!(session.outcomes(), baseline.outcomes());
    assert!(lock.read().unwrap().is_none());
}

#[tokio::test]
async fn test_stalled_reporter_is_cut_off() {
    let (baseline, _) = run_with_reporter(Arc::new(RecordingReporter::default())).await;

    let started = std::time::Instant::now();
    let (session, lock) = run_with_reporter(Arc::new(StalledReporter(Duration::from_secs(30)))).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(session.status(), RunStatus::Completed);
    assert_eq!(session.leads(), baseline.leads());
    assert_eq!(session.outcomes(), baseline.outcomes());
    assert!(lock.read().unwrap().is_none());
}
