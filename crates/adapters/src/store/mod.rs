// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object storage adapters: listing and metadata reads

mod local;

pub use local::LocalFsStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeObjectStore, StoreCall};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from object store operations
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),
    #[error("object not found: {container}/{object}")]
    ObjectNotFound { container: String, object: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub name: String,
    pub last_modified: DateTime<Utc>,
}

/// One page of a listing, in lexicographic name order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectEntry>,
    /// Token for the next page, `None` when the listing is exhausted
    pub next: Option<String>,
}

/// Adapter for reading object storage
#[async_trait]
pub trait ObjectStore: Clone + Send + Sync + 'static {
    /// List up to `max_results` objects, resuming after `continuation`
    ///
    /// At least one object is returned when any remain.
    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
        continuation: Option<&str>,
        max_results: usize,
    ) -> Result<ListPage, ObjectStoreError>;

    /// Last-modified time of one object
    async fn last_modified(
        &self,
        container: &str,
        object: &str,
    ) -> Result<DateTime<Utc>, ObjectStoreError>;
}

/// Build one page from a sorted name listing
///
/// The continuation token is the last name returned; the next page starts
/// strictly after it.
pub(crate) fn page_from_sorted(
    entries: impl IntoIterator<Item = ObjectEntry>,
    prefix: Option<&str>,
    continuation: Option<&str>,
    max_results: usize,
) -> ListPage {
    let mut matching = entries
        .into_iter()
        .filter(|entry| prefix.is_none_or(|p| entry.name.starts_with(p)))
        .filter(|entry| continuation.is_none_or(|after| entry.name.as_str() > after))
        .peekable();

    let limit = max_results.max(1);
    let mut objects = Vec::new();
    while objects.len() < limit {
        match matching.next() {
            Some(entry) => objects.push(entry),
            None => break,
        }
    }

    let next = match (matching.peek(), objects.last()) {
        (Some(_), Some(last)) => Some(last.name.clone()),
        _ => None,
    };
    ListPage { objects, next }
}
