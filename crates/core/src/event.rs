// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending events discovered during a poll cycle

use crate::locator::ObjectLocator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an object write was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Reported by the activity log
    Log,
    /// Found by enumerating the container
    Scan,
    /// Announced by the host after it wrote the object itself
    Notification,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventSource::Log => "log",
            EventSource::Scan => "scan",
            EventSource::Notification => "notification",
        };
        f.write_str(name)
    }
}

/// An object write waiting to be matched and delivered
///
/// Lives for one poll cycle, or longer when a delivery attempt errored and
/// the event sits in the retry queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub locator: ObjectLocator,
    /// Log timestamp for log events, discovery time otherwise
    pub observed_at: DateTime<Utc>,
    /// Last-modified time of the object, when known
    pub version: Option<DateTime<Utc>>,
    pub source: EventSource,
}

impl PendingEvent {
    pub fn new(
        locator: ObjectLocator,
        observed_at: DateTime<Utc>,
        version: Option<DateTime<Utc>>,
        source: EventSource,
    ) -> Self {
        Self {
            locator,
            observed_at,
            version,
            source,
        }
    }

    pub fn container(&self) -> &str {
        &self.locator.container
    }

    pub fn object(&self) -> Option<&str> {
        self.locator.object.as_deref()
    }

    /// Identity used for duplicate suppression: the object name plus version
    pub fn delivery_key(&self) -> DeliveryKey {
        DeliveryKey {
            object: self.locator.path(),
            version: self.version,
        }
    }
}

/// One version of one object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryKey {
    pub object: String,
    pub version: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
