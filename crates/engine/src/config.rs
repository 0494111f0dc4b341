// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener tuning knobs

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the hybrid listener and its poll loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Time between poll cycles
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Objects inspected per cycle, across every scanning container
    pub scan_budget: usize,
    /// Cycles between safety-net sweeps of log-polled containers
    pub scan_every: u64,
    /// How far behind the newest log record the log watermark trails
    #[serde(with = "humantime_serde")]
    pub log_safety_margin: Duration,
    /// Delivered identities remembered per registration
    pub dedup_capacity: usize,
    #[serde(with = "humantime_serde")]
    pub dedup_ttl: Duration,
    /// Executor errors tolerated for one event before it is dropped
    pub max_delivery_attempts: u32,
    /// Passes over leftover scan budget within one cycle
    pub max_budget_rounds: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            scan_budget: 10_000,
            scan_every: 6,
            log_safety_margin: Duration::from_secs(120),
            dedup_capacity: 10_000,
            dedup_ttl: Duration::from_secs(3600),
            max_delivery_attempts: 5,
            max_budget_rounds: 4,
        }
    }
}

impl ListenerConfig {
    /// Whether the periodic safety-net sweep falls on `cycle` (1-based)
    pub fn sweep_due(&self, cycle: u64) -> bool {
        cycle.saturating_sub(1) % self.scan_every.max(1) == 0
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
