// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded memory of recently delivered object versions

use bw_core::DeliveryKey;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Recently delivered identities for one registration
///
/// Entries expire after `ttl` and the oldest are evicted beyond `capacity`.
/// Guards against redundant delivery within one process lifetime only.
#[derive(Debug)]
pub struct DeliveredSet {
    capacity: usize,
    ttl: TimeDelta,
    entries: HashMap<DeliveryKey, DateTime<Utc>>,
    order: VecDeque<(DeliveryKey, DateTime<Utc>)>,
}

impl DeliveredSet {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn contains(&mut self, key: &DeliveryKey, now: DateTime<Utc>) -> bool {
        self.expire(now);
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: DeliveryKey, now: DateTime<Utc>) {
        self.entries.insert(key.clone(), now);
        self.order.push_back((key, now));
        self.expire(now);
        while self.entries.len() > self.capacity {
            if !self.pop_oldest() {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn expire(&mut self, now: DateTime<Utc>) {
        let Some(cutoff) = now.checked_sub_signed(self.ttl) else {
            return;
        };
        while self.order.front().is_some_and(|(_, at)| *at <= cutoff) {
            self.pop_oldest();
        }
    }

    /// Drop the oldest queue entry; a key re-inserted since stays
    fn pop_oldest(&mut self) -> bool {
        let Some((key, at)) = self.order.pop_front() else {
            return false;
        };
        if self.entries.get(&key) == Some(&at) {
            self.entries.remove(&key);
        }
        true
    }
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;
