// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for per-container scan cursors

mod memory;
mod wal;

pub use memory::MemoryCursorStore;
pub use wal::WalCursorStore;

use bw_core::ScanCursor;
use serde::Deserialize;
use thiserror::Error;

/// Errors from cursor storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cursor for container '{container}' cannot be decoded")]
    Corrupt {
        container: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load/save interface for per-container cursors
///
/// Cursors are opaque to callers of the listener; a missing cursor means
/// "start from the beginning".
pub trait CursorStore: Clone + Send + Sync + 'static {
    fn load(&self, container: &str) -> Result<Option<ScanCursor>, StoreError>;

    fn save(&self, container: &str, cursor: &ScanCursor) -> Result<(), StoreError>;

    /// Forget a container's cursor
    fn reset(&self, container: &str) -> Result<(), StoreError>;
}

/// Decode a stored cursor value, naming the container on failure
pub(crate) fn decode(
    container: &str,
    value: &serde_json::Value,
) -> Result<ScanCursor, StoreError> {
    ScanCursor::deserialize(value).map_err(|source| StoreError::Corrupt {
        container: container.to_string(),
        source,
    })
}
