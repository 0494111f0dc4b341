// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-cycle counters

use std::collections::BTreeMap;

/// What one poll cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    /// Write events taken from activity logs
    pub log_events: usize,
    /// Host write notifications consumed
    pub notifications: usize,
    /// Objects inspected per scanned container
    pub scanned: BTreeMap<String, usize>,
    /// Executor runs that reported success
    pub delivered: usize,
    /// Executor runs that reported failure
    pub failed: usize,
    /// Executor runs that errored
    pub errored: usize,
    /// Matches skipped as already delivered or already queued for retry
    pub suppressed: usize,
    /// Retry attempts made this cycle
    pub retried: usize,
    /// Events given up on after repeated errors
    pub dropped: usize,
    /// Containers whose cursor was persisted
    pub committed: usize,
    pub cancelled: bool,
}

impl CycleReport {
    pub fn new(cycle: u64) -> Self {
        Self {
            cycle,
            ..Self::default()
        }
    }

    pub fn total_scanned(&self) -> usize {
        self.scanned.values().sum()
    }

    /// True when the cycle ran an executor or inspected anything
    pub fn is_busy(&self) -> bool {
        self.log_events > 0
            || self.notifications > 0
            || self.total_scanned() > 0
            || self.delivered + self.failed + self.errored > 0
    }
}
