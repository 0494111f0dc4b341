// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write events from a container's activity log

use bw_adapters::{ActivityLog, ActivityLogError, LogRead, LogRecord};
use bw_core::{EventSource, ObjectLocator, PendingEvent};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Write events read since a watermark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBatch {
    /// One event per object, oldest first
    pub events: Vec<PendingEvent>,
    /// Watermark to persist once the events are delivered
    pub next_watermark: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogPoll {
    Events(LogBatch),
    /// The log cannot be read; the caller must scan instead
    Unavailable { reason: String },
}

/// Reads a log and reduces it to per-object write events
#[derive(Clone)]
pub struct ActivityLogPoller<L> {
    log: L,
    safety_margin: TimeDelta,
}

impl<L: ActivityLog> ActivityLogPoller<L> {
    pub fn new(log: L, safety_margin: Duration) -> Self {
        Self {
            log,
            safety_margin: TimeDelta::from_std(safety_margin).unwrap_or(TimeDelta::zero()),
        }
    }

    /// Write events for `container` at or after `watermark`
    ///
    /// The returned watermark trails the newest record by the safety margin
    /// and never moves backwards, so late-arriving records inside the
    /// margin are read again.
    pub async fn poll(
        &self,
        container: &str,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<LogPoll, ActivityLogError> {
        let records = match self.log.read_since(container, watermark).await? {
            LogRead::Available(records) => records,
            LogRead::Unavailable { reason } => return Ok(LogPoll::Unavailable { reason }),
        };

        let newest = records.iter().map(|r| r.timestamp).max();
        let events = collapse_writes(container, records);
        let next_watermark = match newest.and_then(|t| t.checked_sub_signed(self.safety_margin)) {
            Some(candidate) => Some(watermark.map_or(candidate, |w| w.max(candidate))),
            None => watermark,
        };

        Ok(LogPoll::Events(LogBatch {
            events,
            next_watermark,
        }))
    }
}

/// Keep write operations on objects in `container`, latest record per object
fn collapse_writes(container: &str, records: Vec<LogRecord>) -> Vec<PendingEvent> {
    let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
    for record in records {
        if record.container != container || !record.operation.is_write() {
            continue;
        }
        let Some(object) = record.object else {
            continue;
        };
        latest
            .entry(object)
            .and_modify(|t| *t = (*t).max(record.timestamp))
            .or_insert(record.timestamp);
    }

    let mut events: Vec<PendingEvent> = latest
        .into_iter()
        .map(|(object, timestamp)| {
            PendingEvent::new(
                ObjectLocator::new(container, object),
                timestamp,
                None,
                EventSource::Log,
            )
        })
        .collect();
    events.sort_by(|a, b| {
        a.observed_at
            .cmp(&b.observed_at)
            .then_with(|| a.locator.cmp(&b.locator))
    });
    events
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
