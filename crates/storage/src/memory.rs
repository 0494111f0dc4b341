// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory cursor store
//!
//! Clones share one map, so a test can "restart" a listener over the same
//! store and observe what survived.

use crate::{decode, CursorStore, StoreError};
use bw_core::ScanCursor;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryCursorStore {
    cursors: Arc<Mutex<BTreeMap<String, serde_json::Value>>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value, bypassing encoding
    pub fn insert_raw(&self, container: &str, value: serde_json::Value) {
        self.cursors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(container.to_string(), value);
    }

    pub fn containers(&self) -> Vec<String> {
        self.cursors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self, container: &str) -> Result<Option<ScanCursor>, StoreError> {
        let cursors = self.cursors.lock().unwrap_or_else(|e| e.into_inner());
        cursors
            .get(container)
            .map(|value| decode(container, value))
            .transpose()
    }

    fn save(&self, container: &str, cursor: &ScanCursor) -> Result<(), StoreError> {
        let value = serde_json::to_value(cursor)?;
        self.insert_raw(container, value);
        Ok(())
    }

    fn reset(&self, container: &str) -> Result<(), StoreError> {
        self.cursors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(container);
        Ok(())
    }
}
