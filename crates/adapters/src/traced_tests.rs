// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::activity::FakeActivityLog;
use crate::executor::{FakeExecutor, Outcome};
use crate::store::FakeObjectStore;
use chrono::TimeZone;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

// =============================================================================
// Precondition validation tests
// =============================================================================

#[tokio::test]
async fn traced_store_rejects_invalid_container() {
    let fake = FakeObjectStore::new();
    let traced = TracedObjectStore::new(fake.clone());

    let err = traced.list("Bad_Name", None, None, 10).await.unwrap_err();
    assert!(
        err.to_string().contains("Bad_Name"),
        "Expected error citing the container, got: {}",
        err
    );
    assert!(fake.calls().is_empty(), "inner store must not be called");
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_store_list_logs_span_and_timing() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeObjectStore::new();
        fake.put("input", "a.csv", at(1));
        TracedObjectStore::new(fake)
            .list("input", None, None, 10)
            .await
    });

    assert!(result.is_ok(), "list should succeed: {:?}", result);
    assert!(logs.contains("store.list"), "Should log span name. Logs:\n{}", logs);
    assert!(logs.contains("input"), "Should log container. Logs:\n{}", logs);
    assert!(logs.contains("elapsed_ms"), "Should log timing. Logs:\n{}", logs);
}

#[test]
fn traced_log_reports_unavailable() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeActivityLog::new();
        fake.set_unavailable("input", true);
        TracedActivityLog::new(fake).read_since("input", None).await
    });

    assert!(matches!(result, Ok(LogRead::Unavailable { .. })));
    assert!(logs.contains("log.read"), "Should log span name. Logs:\n{}", logs);
    assert!(
        logs.contains("log unavailable"),
        "Should log degraded mode. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_executor_logs_each_outcome() {
    let (logs, results) = with_tracing(|| async {
        let fake = FakeExecutor::new();
        fake.push_outcome("input/a.csv", Outcome::Failure);
        fake.push_outcome("input/a.csv", Outcome::Error);
        let traced = TracedExecutor::new(fake);
        let locator = ObjectLocator::new("input", "a.csv");
        let cancel = CancelSignal::never();

        let mut results = Vec::new();
        for _ in 0..3 {
            results.push(traced.execute(&locator, &BindingData::new(), &cancel).await.ok());
        }
        results
    });

    assert_eq!(results, vec![Some(false), None, Some(true)]);
    assert!(logs.contains("executor.execute"), "Logs:\n{}", logs);
    assert!(logs.contains("input/a.csv"), "Logs:\n{}", logs);
    assert!(logs.contains("succeeded"), "Logs:\n{}", logs);
    assert!(logs.contains("execution error"), "Logs:\n{}", logs);
}
