// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{ListenerConfig, ListenerDeps};
use bw_adapters::{FakeActivityLog, FakeExecutor, FakeObjectStore};
use bw_core::{CancelSource, FakeClock, SequentialIdGen};
use bw_storage::MemoryCursorStore;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

type TestListener =
    HybridListener<FakeObjectStore, FakeActivityLog, MemoryCursorStore, FakeClock, SequentialIdGen>;

fn listener(store: &FakeObjectStore, cursors: &MemoryCursorStore) -> TestListener {
    HybridListener::new(
        ListenerDeps {
            store: store.clone(),
            log: FakeActivityLog::new(),
            cursors: cursors.clone(),
        },
        ListenerConfig {
            poll_interval: Duration::from_millis(5),
            scan_every: 1,
            ..ListenerConfig::default()
        },
        FakeClock::at(Utc.timestamp_opt(10_000, 0).unwrap()),
        SequentialIdGen::new("reg"),
    )
}

#[tokio::test]
async fn loop_runs_cycles_until_cancelled() {
    let store = FakeObjectStore::new();
    store.put("input", "a.csv", Utc.timestamp_opt(100, 0).unwrap());
    let cursors = MemoryCursorStore::new();
    let mut listener = listener(&store, &cursors);
    let executor = FakeExecutor::new();
    listener
        .handle()
        .register("input", None, Arc::new(executor.clone()))
        .unwrap();

    let source = CancelSource::new();
    let signal = source.signal();
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        source.cancel();
    });

    run_poll_loop(&mut listener, &signal).await.unwrap();
    stopper.await.unwrap();

    assert!(listener.cycle() >= 2);
    assert_eq!(executor.paths(), vec!["input/a.csv"]);
    assert!(cursors.load("input").unwrap().is_some());
}

#[tokio::test]
async fn corrupt_cursor_is_reset_and_polling_continues() {
    let store = FakeObjectStore::new();
    store.put("input", "a.csv", Utc.timestamp_opt(100, 0).unwrap());
    let cursors = MemoryCursorStore::new();
    cursors.insert_raw("input", serde_json::json!("not a cursor"));
    let mut listener = listener(&store, &cursors);
    let executor = FakeExecutor::new();
    listener
        .handle()
        .register("input", None, Arc::new(executor.clone()))
        .unwrap();

    let source = CancelSource::new();
    let signal = source.signal();
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        source.cancel();
    });

    run_poll_loop(&mut listener, &signal).await.unwrap();
    stopper.await.unwrap();

    assert_eq!(executor.paths(), vec!["input/a.csv"]);
    let cursor = cursors.load("input").unwrap().unwrap();
    assert!(cursor.sweep.watermark.is_some());
}

#[tokio::test]
async fn already_cancelled_loop_runs_nothing() {
    let store = FakeObjectStore::new();
    let cursors = MemoryCursorStore::new();
    let mut listener = listener(&store, &cursors);

    let source = CancelSource::new();
    source.cancel();
    run_poll_loop(&mut listener, &source.signal()).await.unwrap();
    assert_eq!(listener.cycle(), 0);
}
