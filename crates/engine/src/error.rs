// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use bw_storage::StoreError;
use thiserror::Error;

/// Errors a poll cycle hands back to its host
#[derive(Debug, Error)]
pub enum EngineError {
    /// Persisted progress for a container cannot be decoded
    ///
    /// The host recovers by resetting the cursor, which restarts the
    /// container from the beginning.
    #[error("cursor for container '{container}' is corrupt: {source}")]
    CorruptCursor {
        container: String,
        #[source]
        source: StoreError,
    },
    #[error("cursor store error: {0}")]
    Store(#[from] StoreError),
}
