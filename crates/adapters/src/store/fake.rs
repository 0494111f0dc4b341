// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake object store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{page_from_sorted, ListPage, ObjectEntry, ObjectStore, ObjectStoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List {
        container: String,
        prefix: Option<String>,
        continuation: Option<String>,
        max_results: usize,
    },
    LastModified {
        container: String,
        object: String,
    },
}

#[derive(Default)]
struct FakeStoreState {
    containers: BTreeMap<String, BTreeMap<String, DateTime<Utc>>>,
    failing: HashSet<String>,
    calls: Vec<StoreCall>,
}

/// In-memory object store for testing
#[derive(Clone, Default)]
pub struct FakeObjectStore {
    inner: Arc<Mutex<FakeStoreState>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeStoreState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create_container(&self, container: &str) {
        self.state()
            .containers
            .entry(container.to_string())
            .or_default();
    }

    /// Create or overwrite an object, creating its container if needed
    pub fn put(&self, container: &str, object: &str, last_modified: DateTime<Utc>) {
        self.state()
            .containers
            .entry(container.to_string())
            .or_default()
            .insert(object.to_string(), last_modified);
    }

    pub fn delete(&self, container: &str, object: &str) {
        if let Some(objects) = self.state().containers.get_mut(container) {
            objects.remove(object);
        }
    }

    /// Make every call against `container` fail until cleared
    pub fn set_failing(&self, container: &str, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing.insert(container.to_string());
        } else {
            state.failing.remove(container);
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Number of list calls made against `container`
    pub fn list_count(&self, container: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| matches!(call, StoreCall::List { container: c, .. } if c == container))
            .count()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
        continuation: Option<&str>,
        max_results: usize,
    ) -> Result<ListPage, ObjectStoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::List {
            container: container.to_string(),
            prefix: prefix.map(str::to_string),
            continuation: continuation.map(str::to_string),
            max_results,
        });

        if state.failing.contains(container) {
            return Err(ObjectStoreError::Request(format!("listing {} failed", container)));
        }
        let objects = state
            .containers
            .get(container)
            .ok_or_else(|| ObjectStoreError::ContainerNotFound(container.to_string()))?;

        let entries = objects.iter().map(|(name, last_modified)| ObjectEntry {
            name: name.clone(),
            last_modified: *last_modified,
        });
        Ok(page_from_sorted(entries, prefix, continuation, max_results))
    }

    async fn last_modified(
        &self,
        container: &str,
        object: &str,
    ) -> Result<DateTime<Utc>, ObjectStoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::LastModified {
            container: container.to_string(),
            object: object.to_string(),
        });

        if state.failing.contains(container) {
            return Err(ObjectStoreError::Request(format!("lookup in {} failed", container)));
        }
        state
            .containers
            .get(container)
            .ok_or_else(|| ObjectStoreError::ContainerNotFound(container.to_string()))?
            .get(object)
            .copied()
            .ok_or_else(|| ObjectStoreError::ObjectNotFound {
                container: container.to_string(),
                object: object.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
