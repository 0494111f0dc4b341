// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn key(object: &str, version: i64) -> DeliveryKey {
    DeliveryKey {
        object: format!("input/{}", object),
        version: Some(at(version)),
    }
}

#[test]
fn remembers_delivered_versions() {
    let mut set = DeliveredSet::new(10, Duration::from_secs(60));
    set.insert(key("a", 1), at(100));
    assert!(set.contains(&key("a", 1), at(100)));
    // A new version of the same object is a different identity
    assert!(!set.contains(&key("a", 2), at(100)));
}

#[test]
fn entries_expire_after_ttl() {
    let mut set = DeliveredSet::new(10, Duration::from_secs(60));
    set.insert(key("a", 1), at(100));
    assert!(set.contains(&key("a", 1), at(159)));
    assert!(!set.contains(&key("a", 1), at(160)));
    assert!(set.is_empty());
}

#[test]
fn oldest_entries_are_evicted_beyond_capacity() {
    let mut set = DeliveredSet::new(2, Duration::from_secs(60));
    set.insert(key("a", 1), at(100));
    set.insert(key("b", 1), at(101));
    set.insert(key("c", 1), at(102));
    assert_eq!(set.len(), 2);
    assert!(!set.contains(&key("a", 1), at(102)));
    assert!(set.contains(&key("b", 1), at(102)));
    assert!(set.contains(&key("c", 1), at(102)));
}

#[test]
fn reinserting_refreshes_an_entry() {
    let mut set = DeliveredSet::new(10, Duration::from_secs(60));
    set.insert(key("a", 1), at(100));
    set.insert(key("a", 1), at(150));
    // The stale queue entry from t=100 must not evict the refreshed key
    assert!(set.contains(&key("a", 1), at(170)));
    assert!(!set.contains(&key("a", 1), at(210)));
}

#[test]
fn huge_ttl_never_expires() {
    let mut set = DeliveredSet::new(10, Duration::MAX);
    set.insert(key("a", 1), at(100));
    assert!(set.contains(&key("a", 1), at(1_000_000_000)));
}
