// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use bw_adapters::{ExecutorError, FakeActivityLog, FakeExecutor, FakeObjectStore, Outcome};
use bw_core::{BindingData, CancelSource, FakeClock, SequentialIdGen};
use bw_storage::MemoryCursorStore;
use chrono::TimeZone;
use std::time::Duration;

type TestListener =
    HybridListener<FakeObjectStore, FakeActivityLog, MemoryCursorStore, FakeClock, SequentialIdGen>;

struct Harness {
    store: FakeObjectStore,
    log: FakeActivityLog,
    cursors: MemoryCursorStore,
    clock: FakeClock,
    listener: TestListener,
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn harness(config: ListenerConfig) -> Harness {
    let store = FakeObjectStore::new();
    store.create_container("input");
    let log = FakeActivityLog::new();
    let cursors = MemoryCursorStore::new();
    let clock = FakeClock::at(at(10_000));
    let listener = HybridListener::new(
        ListenerDeps {
            store: store.clone(),
            log: log.clone(),
            cursors: cursors.clone(),
        },
        config,
        clock.clone(),
        SequentialIdGen::new("reg"),
    );
    Harness {
        store,
        log,
        cursors,
        clock,
        listener,
    }
}

impl Harness {
    /// An object written at `secs`, visible to both the store and the log
    fn write(&self, object: &str, secs: i64) {
        self.store.put("input", object, at(secs));
        self.log.put("input", object, at(secs));
    }

    fn watch(&self, pattern: Option<&str>) -> FakeExecutor {
        let executor = FakeExecutor::new();
        self.listener
            .handle()
            .register("input", pattern, Arc::new(executor.clone()))
            .unwrap();
        executor
    }

    async fn cycle(&mut self) -> CycleReport {
        let report = self
            .listener
            .poll_cycle(&CancelSignal::never())
            .await
            .unwrap();
        self.clock.advance(Duration::from_secs(10));
        report
    }
}

fn config() -> ListenerConfig {
    ListenerConfig {
        log_safety_margin: Duration::ZERO,
        ..ListenerConfig::default()
    }
}

#[tokio::test]
async fn log_events_are_delivered_with_captures() {
    let mut h = harness(config());
    let executor = h.watch(Some("input/{name}.csv"));
    h.write("foo.bar.csv", 100);
    h.write("notes.txt", 110);

    let report = h.cycle().await;
    assert_eq!(report.log_events, 2);
    assert_eq!(report.delivered, 1);
    // The first-cycle sweep finds the same version and is suppressed
    assert_eq!(report.suppressed, 1);
    assert_eq!(h.listener.mode("input"), Some(ContainerMode::LogPolling));

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].locator, ObjectLocator::new("input", "foo.bar.csv"));
    assert_eq!(calls[0].data.get("name").map(String::as_str), Some("foo.bar"));
}

#[tokio::test]
async fn later_writes_are_picked_up_from_the_log() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.cycle().await;

    h.write("a.csv", 200);
    let report = h.cycle().await;
    assert_eq!(report.delivered, 1);
    assert!(report.scanned.is_empty());
    assert_eq!(executor.paths(), vec!["input/a.csv"]);
}

#[tokio::test]
async fn log_events_are_delivered_in_time_order() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.cycle().await;

    h.write("late.csv", 300);
    h.write("early.csv", 200);
    h.write("middle.csv", 250);
    h.cycle().await;
    assert_eq!(
        executor.paths(),
        vec!["input/early.csv", "input/middle.csv", "input/late.csv"]
    );
}

#[tokio::test]
async fn safety_net_sweeps_run_every_kth_cycle() {
    let mut h = harness(ListenerConfig {
        scan_every: 3,
        ..config()
    });
    h.watch(None);

    let scanned: Vec<bool> = {
        let mut scanned = Vec::new();
        for _ in 0..4 {
            scanned.push(h.cycle().await.scanned.contains_key("input"));
        }
        scanned
    };
    assert_eq!(scanned, vec![true, false, false, true]);
}

#[tokio::test]
async fn sweep_catches_writes_the_log_missed() {
    let mut h = harness(ListenerConfig {
        scan_every: 2,
        ..config()
    });
    let executor = h.watch(None);
    h.cycle().await;

    // Written without a log record
    h.store.put("input", "silent.csv", at(500));
    let second = h.cycle().await;
    assert_eq!(second.delivered, 0);
    let third = h.cycle().await;
    assert_eq!(third.delivered, 1);
    assert_eq!(executor.paths(), vec!["input/silent.csv"]);
}

#[tokio::test]
async fn unavailable_log_switches_to_scan_only_for_good() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.log.set_unavailable("input", true);
    h.store.put("input", "a.csv", at(100));

    let first = h.cycle().await;
    assert_eq!(first.delivered, 1);
    assert_eq!(h.listener.mode("input"), Some(ContainerMode::ScanOnly));

    h.log.set_unavailable("input", false);
    h.store.put("input", "b.csv", at(200));
    for _ in 0..3 {
        let report = h.cycle().await;
        assert!(report.scanned.contains_key("input"));
    }
    assert_eq!(h.log.read_count("input"), 1);
    assert_eq!(executor.paths(), vec!["input/a.csv", "input/b.csv"]);
}

#[tokio::test]
async fn failed_log_read_falls_back_to_scanning_for_that_cycle() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.cycle().await;
    assert_eq!(h.listener.mode("input"), Some(ContainerMode::LogPolling));

    h.log.set_failing("input", true);
    h.store.put("input", "a.csv", at(100));
    let report = h.cycle().await;
    assert_eq!(h.listener.mode("input"), Some(ContainerMode::ScanFallback));
    assert_eq!(report.scanned.get("input"), Some(&1));
    assert_eq!(executor.paths(), vec!["input/a.csv"]);

    h.log.set_failing("input", false);
    let report = h.cycle().await;
    assert_eq!(h.listener.mode("input"), Some(ContainerMode::LogPolling));
    assert!(report.scanned.is_empty());
}

#[tokio::test]
async fn unavailable_after_first_contact_is_only_a_fallback() {
    let mut h = harness(config());
    h.watch(None);
    h.cycle().await;

    h.log.set_unavailable("input", true);
    h.cycle().await;
    assert_eq!(h.listener.mode("input"), Some(ContainerMode::ScanFallback));

    h.log.set_unavailable("input", false);
    h.cycle().await;
    assert_eq!(h.listener.mode("input"), Some(ContainerMode::LogPolling));
    assert_eq!(h.log.read_count("input"), 3);
}

#[tokio::test]
async fn every_registration_gets_its_own_delivery() {
    let mut h = harness(config());
    let csv = h.watch(Some("input/{name}.csv"));
    let any = h.watch(None);
    h.write("a.csv", 100);

    let report = h.cycle().await;
    assert_eq!(report.delivered, 2);
    assert_eq!(csv.paths(), vec!["input/a.csv"]);
    assert_eq!(any.paths(), vec!["input/a.csv"]);
}

#[tokio::test]
async fn rewritten_object_is_delivered_again() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.write("a.csv", 100);
    h.cycle().await;

    h.write("a.csv", 300);
    let report = h.cycle().await;
    assert_eq!(report.delivered, 1);
    assert_eq!(executor.paths(), vec!["input/a.csv", "input/a.csv"]);
}

#[tokio::test]
async fn failure_result_is_not_retried() {
    let mut h = harness(config());
    let executor = h.watch(None);
    executor.push_outcome("input/a.csv", Outcome::Failure);
    h.write("a.csv", 100);

    let first = h.cycle().await;
    assert_eq!(first.failed, 1);
    assert_eq!(h.listener.pending_retries(), 0);

    // The record is read again inside the watermark window but not re-run
    let second = h.cycle().await;
    assert_eq!(second.retried, 0);
    assert_eq!(second.suppressed, 1);
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn errored_delivery_is_retried_next_cycle() {
    let mut h = harness(config());
    let executor = h.watch(None);
    executor.push_outcome("input/a.csv", Outcome::Error);
    h.write("a.csv", 100);
    h.write("b.csv", 200);

    let first = h.cycle().await;
    assert_eq!(first.errored, 1);
    assert_eq!(first.delivered, 1);
    assert_eq!(h.listener.pending_retries(), 1);

    // Persisted progress stays behind the pending event
    let saved = h.cursors.load("input").unwrap().unwrap();
    assert_eq!(saved.log_watermark, Some(at(100)));
    assert_eq!(
        h.listener.cursor("input").unwrap().log_watermark,
        Some(at(200))
    );

    let second = h.cycle().await;
    assert_eq!(second.retried, 1);
    assert_eq!(second.delivered, 1);
    assert_eq!(h.listener.pending_retries(), 0);
    assert_eq!(
        h.cursors.load("input").unwrap().unwrap().log_watermark,
        Some(at(200))
    );
    assert_eq!(
        executor.paths(),
        vec!["input/a.csv", "input/b.csv", "input/a.csv"]
    );
}

#[tokio::test]
async fn repeated_errors_are_dropped_after_max_attempts() {
    let mut h = harness(ListenerConfig {
        max_delivery_attempts: 2,
        ..config()
    });
    let executor = h.watch(None);
    for _ in 0..3 {
        executor.push_outcome("input/a.csv", Outcome::Error);
    }
    h.write("a.csv", 100);

    let first = h.cycle().await;
    assert_eq!(first.errored, 1);
    let second = h.cycle().await;
    assert_eq!(second.retried, 1);
    assert_eq!(second.dropped, 1);
    assert_eq!(h.listener.pending_retries(), 0);

    let third = h.cycle().await;
    assert_eq!(third.errored, 0);
    assert_eq!(executor.calls().len(), 2);
}

#[tokio::test]
async fn notifications_are_delivered_next_cycle() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.cycle().await;

    h.store.put("input", "made-here.csv", at(700));
    let handle = h.listener.handle();
    handle.notify_written(ObjectLocator::new("input", "made-here.csv"));
    handle.notify_written(ObjectLocator::new("unwatched", "x.csv"));
    handle.notify_written(ObjectLocator::container("input"));

    let report = h.cycle().await;
    assert_eq!(report.notifications, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(executor.paths(), vec!["input/made-here.csv"]);
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn logged_objects_that_are_gone_are_skipped() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.log.put("input", "gone.csv", at(100));

    let report = h.cycle().await;
    assert_eq!(report.log_events, 0);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn version_lookup_failure_uses_log_time() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.write("a.csv", 100);
    h.store.set_failing("input", true);

    let report = h.cycle().await;
    assert_eq!(report.delivered, 1);
    assert!(!report.scanned.contains_key("input"));
    assert_eq!(executor.paths(), vec!["input/a.csv"]);
}

#[tokio::test]
async fn cursor_is_persisted_after_delivery() {
    let mut h = harness(config());
    h.watch(None);
    h.write("a.csv", 100);

    let report = h.cycle().await;
    assert_eq!(report.committed, 1);
    let saved = h.cursors.load("input").unwrap().unwrap();
    assert_eq!(saved.log_watermark, Some(at(100)));
    assert_eq!(saved.sweep.watermark, Some(at(100)));

    // Nothing changed, nothing written
    let report = h.cycle().await;
    assert_eq!(report.committed, 0);
}

#[tokio::test]
async fn corrupt_cursor_is_reported_and_reset() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.write("a.csv", 100);
    h.cursors
        .insert_raw("input", serde_json::json!({ "log_watermark": 12 }));

    let err = h
        .listener
        .poll_cycle(&CancelSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(&err, EngineError::CorruptCursor { container, .. } if container == "input"));
    assert!(executor.calls().is_empty());

    h.listener.reset_cursor("input").unwrap();
    let report = h.cycle().await;
    assert_eq!(report.delivered, 1);
}

#[tokio::test]
async fn cancelled_cycle_starts_nothing() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.write("a.csv", 100);

    let source = CancelSource::new();
    source.cancel();
    let report = h.listener.poll_cycle(&source.signal()).await.unwrap();
    assert!(report.cancelled);
    assert!(executor.calls().is_empty());
    assert!(h.cursors.containers().is_empty());
}

/// Records like `FakeExecutor`, then cancels the cycle it runs in
struct CancellingExecutor {
    inner: FakeExecutor,
    source: Arc<CancelSource>,
}

#[async_trait]
impl TriggerExecutor for CancellingExecutor {
    async fn execute(
        &self,
        locator: &ObjectLocator,
        data: &BindingData,
        cancel: &CancelSignal,
    ) -> Result<bool, ExecutorError> {
        let result = self.inner.execute(locator, data, cancel).await;
        self.source.cancel();
        result
    }
}

#[tokio::test]
async fn cancel_mid_cycle_keeps_finished_containers_only() {
    let mut h = harness(config());
    h.store.create_container("archive");
    h.store.put("archive", "old.csv", at(100));
    h.log.put("archive", "old.csv", at(100));
    h.write("a.csv", 100);

    let source = Arc::new(CancelSource::new());
    let first = FakeExecutor::new();
    let handle = h.listener.handle();
    handle
        .register(
            "archive",
            None,
            Arc::new(CancellingExecutor {
                inner: first.clone(),
                source: Arc::clone(&source),
            }),
        )
        .unwrap();
    let second = h.watch(None);

    let report = h.listener.poll_cycle(&source.signal()).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(first.paths(), vec!["archive/old.csv"]);
    assert!(second.calls().is_empty());
    assert_eq!(h.cursors.containers(), vec!["archive".to_string()]);

    // The unfinished container is picked up by the next cycle
    let report = h.cycle().await;
    assert_eq!(second.paths(), vec!["input/a.csv"]);
    assert_eq!(first.calls().len(), 1);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn logged_objects_run_before_fresher_notifications() {
    let mut h = harness(config());
    let executor = h.watch(None);
    h.write("old.csv", 100);
    h.store.put("input", "fresh.csv", at(9_990));
    h.listener
        .handle()
        .notify_written(ObjectLocator::new("input", "fresh.csv"));

    let report = h.cycle().await;

    assert_eq!(report.notifications, 1);
    assert_eq!(executor.paths(), vec!["input/old.csv", "input/fresh.csv"]);
}

#[tokio::test]
async fn unregistered_container_is_forgotten() {
    let mut h = harness(config());
    let executor = FakeExecutor::new();
    let handle = h.listener.handle();
    let registration = handle
        .register("input", None, Arc::new(executor.clone()))
        .unwrap();
    h.cycle().await;
    assert!(h.listener.mode("input").is_some());

    assert!(handle.unregister(&registration));
    h.write("a.csv", 100);
    let report = h.cycle().await;
    assert_eq!(report.log_events, 0);
    assert!(h.listener.mode("input").is_none());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn sweeps_share_the_budget() {
    let mut h = harness(ListenerConfig {
        scan_budget: 6,
        ..config()
    });
    h.store.create_container("small");
    for i in 0..10 {
        h.store.put("input", &format!("big-{:02}", i), at(100));
    }
    h.store.put("small", "one", at(100));
    h.store.put("small", "two", at(100));
    h.log.set_unavailable("input", true);
    h.log.set_unavailable("small", true);

    let handle = h.listener.handle();
    let big = FakeExecutor::new();
    let small = FakeExecutor::new();
    handle.register("input", None, Arc::new(big.clone())).unwrap();
    handle.register("small", None, Arc::new(small.clone())).unwrap();

    let report = h.cycle().await;
    assert_eq!(report.scanned.get("small"), Some(&2));
    assert_eq!(report.scanned.get("input"), Some(&4));
    assert_eq!(small.calls().len(), 2);
    assert_eq!(big.calls().len(), 4);
}
