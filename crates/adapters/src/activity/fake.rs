// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake activity log for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ActivityLog, ActivityLogError, LogRead, LogRecord, OperationKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Recorded log read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCall {
    pub container: String,
    pub since: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct FakeLogState {
    records: Vec<LogRecord>,
    unavailable: HashSet<String>,
    failing: HashSet<String>,
    calls: Vec<LogCall>,
}

/// In-memory activity log for testing
#[derive(Clone, Default)]
pub struct FakeActivityLog {
    inner: Arc<Mutex<FakeLogState>>,
}

impl FakeActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeLogState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, record: LogRecord) {
        self.state().records.push(record);
    }

    /// Record a `PutBlob` of `container/object` at `timestamp`
    pub fn put(&self, container: &str, object: &str, timestamp: DateTime<Utc>) {
        self.push(LogRecord {
            timestamp,
            operation: OperationKind::PutBlob,
            container: container.to_string(),
            object: Some(object.to_string()),
        });
    }

    /// Report the log as unavailable for `container`
    pub fn set_unavailable(&self, container: &str, unavailable: bool) {
        let mut state = self.state();
        if unavailable {
            state.unavailable.insert(container.to_string());
        } else {
            state.unavailable.remove(container);
        }
    }

    /// Fail reads for `container` with a transient error
    pub fn set_failing(&self, container: &str, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing.insert(container.to_string());
        } else {
            state.failing.remove(container);
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<LogCall> {
        self.state().calls.clone()
    }

    /// Number of reads made for `container`
    pub fn read_count(&self, container: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.container == container)
            .count()
    }
}

#[async_trait]
impl ActivityLog for FakeActivityLog {
    async fn read_since(
        &self,
        container: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<LogRead, ActivityLogError> {
        let mut state = self.state();
        state.calls.push(LogCall {
            container: container.to_string(),
            since,
        });

        if state.failing.contains(container) {
            return Err(ActivityLogError::Request(format!(
                "reading log for {} failed",
                container
            )));
        }
        if state.unavailable.contains(container) {
            return Ok(LogRead::Unavailable {
                reason: "logging disabled".to_string(),
            });
        }

        let records = state
            .records
            .iter()
            .filter(|r| r.container == container)
            .filter(|r| since.is_none_or(|t| r.timestamp >= t))
            .cloned()
            .collect();
        Ok(LogRead::Available(records))
    }
}
