// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[test]
fn delivery_key_distinguishes_versions() {
    let first = PendingEvent::new(
        ObjectLocator::new("input", "a.csv"),
        at(10),
        Some(at(5)),
        EventSource::Log,
    );
    let rescanned = PendingEvent::new(
        ObjectLocator::new("input", "a.csv"),
        at(99),
        Some(at(5)),
        EventSource::Scan,
    );
    let rewritten = PendingEvent::new(
        ObjectLocator::new("input", "a.csv"),
        at(99),
        Some(at(20)),
        EventSource::Scan,
    );

    assert_eq!(first.delivery_key(), rescanned.delivery_key());
    assert_ne!(first.delivery_key(), rewritten.delivery_key());
}

#[test]
fn accessors_expose_locator_parts() {
    let event = PendingEvent::new(
        ObjectLocator::new("input", "dir/a.csv"),
        at(1),
        None,
        EventSource::Notification,
    );
    assert_eq!(event.container(), "input");
    assert_eq!(event.object(), Some("dir/a.csv"));
    assert_eq!(event.delivery_key().object, "input/dir/a.csv");
}

#[test]
fn source_serializes_in_snake_case() {
    let json = serde_json::to_string(&EventSource::Notification).unwrap();
    assert_eq!(json, "\"notification\"");
    assert_eq!(EventSource::Scan.to_string(), "scan");
}
