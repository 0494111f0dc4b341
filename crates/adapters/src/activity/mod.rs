// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-activity log adapters

pub mod analytics;
mod disabled;
mod file;

pub use disabled::DisabledActivityLog;
pub use file::FileActivityLog;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeActivityLog, LogCall};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Errors from activity log reads
#[derive(Debug, Error)]
pub enum ActivityLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request failed: {0}")]
    Request(String),
}

/// Storage operation recorded in the activity log
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    PutBlob,
    PutBlockList,
    CopyBlob,
    CopyBlobDestination,
    CopyBlobSource,
    SetBlobMetadata,
    SetBlobProperties,
    DeleteBlob,
    GetBlob,
    Other(String),
}

impl OperationKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "PutBlob" => Self::PutBlob,
            "PutBlockList" => Self::PutBlockList,
            "CopyBlob" => Self::CopyBlob,
            "CopyBlobDestination" => Self::CopyBlobDestination,
            "CopyBlobSource" => Self::CopyBlobSource,
            "SetBlobMetadata" => Self::SetBlobMetadata,
            "SetBlobProperties" => Self::SetBlobProperties,
            "DeleteBlob" => Self::DeleteBlob,
            "GetBlob" => Self::GetBlob,
            other => Self::Other(other.to_string()),
        }
    }

    /// True for operations that create or overwrite an object
    ///
    /// The source side of a copy is a read and does not count.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::PutBlob
                | Self::PutBlockList
                | Self::CopyBlob
                | Self::CopyBlobDestination
                | Self::SetBlobMetadata
                | Self::SetBlobProperties
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(name) => f.write_str(name),
            known => write!(f, "{:?}", known),
        }
    }
}

/// One activity log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub operation: OperationKind,
    pub container: String,
    /// `None` for container-level operations
    pub object: Option<String>,
}

/// Result of reading the activity log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRead {
    /// Records at or after the requested time, in no particular order
    Available(Vec<LogRecord>),
    /// Logging is disabled or unreachable
    Unavailable { reason: String },
}

/// Adapter for reading a storage write-activity log
#[async_trait]
pub trait ActivityLog: Clone + Send + Sync + 'static {
    /// Records for `container` with a timestamp at or after `since`
    async fn read_since(
        &self,
        container: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<LogRead, ActivityLogError>;
}
