// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-container progress markers persisted between poll cycles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress for one container: how far its activity log and its
/// enumeration sweep have been processed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCursor {
    /// Activity log records at or after this time are read next cycle
    #[serde(default)]
    pub log_watermark: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sweep: SweepState,
}

impl ScanCursor {
    /// Move the log watermark back so it covers `time`
    pub fn clamp_log_watermark(&mut self, time: DateTime<Utc>) {
        if let Some(current) = self.log_watermark {
            self.log_watermark = Some(current.min(time));
        }
    }
}

/// Position of a bounded enumeration sweep
///
/// A sweep walks a container one page at a time. An object is new when its
/// last-modified time is strictly later than `watermark`, the latest
/// last-modified seen by the previous completed sweep. The watermark never
/// passes the time the sweep started, since objects rewritten behind the
/// continuation while it ran were not seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepState {
    /// Resume point inside the current sweep
    #[serde(default)]
    pub continuation: Option<String>,
    #[serde(default)]
    pub watermark: Option<DateTime<Utc>>,
    /// When the current sweep listed its first page
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Latest last-modified seen so far in the current sweep
    #[serde(default)]
    pub current_latest: Option<DateTime<Utc>>,
    /// Objects inspected so far in the current sweep
    #[serde(default)]
    pub scanned: u64,
    /// Size of the last completed sweep
    #[serde(default)]
    pub last_sweep_size: Option<u64>,
}

impl SweepState {
    pub fn in_progress(&self) -> bool {
        self.continuation.is_some()
    }

    /// Stamp the start of a sweep; no-op once a sweep is under way
    pub fn begin(&mut self, now: DateTime<Utc>) {
        if self.continuation.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Whether an object with this last-modified time counts as new
    pub fn is_new(&self, last_modified: DateTime<Utc>) -> bool {
        !matches!(self.watermark, Some(watermark) if last_modified <= watermark)
    }

    /// Objects still expected in the current sweep, if a sweep has completed before
    pub fn remaining_estimate(&self) -> Option<u64> {
        self.last_sweep_size
            .map(|size| size.saturating_sub(self.scanned))
    }

    /// Record one inspected object
    pub fn observe(&mut self, last_modified: DateTime<Utc>) {
        self.scanned += 1;
        self.current_latest = Some(match self.current_latest {
            Some(latest) => latest.max(last_modified),
            None => last_modified,
        });
    }

    /// Finish the current sweep, promoting its latest time to the watermark
    pub fn complete(&mut self) {
        let seen = match (self.current_latest, self.started_at) {
            (Some(latest), Some(started)) => Some(latest.min(started)),
            (latest, _) => latest,
        };
        self.watermark = match (self.watermark, seen) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.last_sweep_size = Some(self.scanned);
        self.continuation = None;
        self.started_at = None;
        self.current_latest = None;
        self.scanned = 0;
    }

    /// Restart the sweep so that an object modified at `version` is seen again
    pub fn rewind_before(&mut self, version: DateTime<Utc>) {
        self.continuation = None;
        self.started_at = None;
        self.current_latest = None;
        self.scanned = 0;
        if self.watermark.is_some_and(|watermark| watermark >= version) {
            self.watermark = version.checked_sub_signed(chrono::TimeDelta::nanoseconds(1));
        }
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
