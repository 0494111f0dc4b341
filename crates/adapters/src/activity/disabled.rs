// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity log for hosts without one

use super::{ActivityLog, ActivityLogError, LogRead};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Always reports the log as unavailable, so every container is scanned
#[derive(Clone, Default)]
pub struct DisabledActivityLog;

impl DisabledActivityLog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActivityLog for DisabledActivityLog {
    async fn read_since(
        &self,
        _container: &str,
        _since: Option<DateTime<Utc>>,
    ) -> Result<LogRead, ActivityLogError> {
        Ok(LogRead::Unavailable {
            reason: "activity logging is not configured".to_string(),
        })
    }
}
