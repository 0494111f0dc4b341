// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::activity::{ActivityLog, ActivityLogError, LogRead};
use crate::executor::{ExecutorError, TriggerExecutor};
use crate::store::{ListPage, ObjectStore, ObjectStoreError};
use async_trait::async_trait;
use bw_core::{validate_container_name, BindingData, CancelSignal, ObjectLocator};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::Instrument;

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Wrapper that adds tracing to any ObjectStore
#[derive(Clone)]
pub struct TracedObjectStore<S> {
    inner: S,
}

impl<S> TracedObjectStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for TracedObjectStore<S> {
    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
        continuation: Option<&str>,
        max_results: usize,
    ) -> Result<ListPage, ObjectStoreError> {
        let span = tracing::info_span!("store.list", container, prefix, max_results);
        async move {
            // Precondition: container name must be addressable
            if let Err(e) = validate_container_name(container) {
                tracing::error!(error = %e, "invalid container name");
                return Err(ObjectStoreError::Request(e.to_string()));
            }

            tracing::debug!(continuation, "listing");
            let start = Instant::now();
            let result = self
                .inner
                .list(container, prefix, continuation, max_results)
                .await;

            match &result {
                Ok(page) => tracing::debug!(
                    count = page.objects.len(),
                    more = page.next.is_some(),
                    elapsed_ms = elapsed_ms(start),
                    "listed"
                ),
                Err(ObjectStoreError::ContainerNotFound(_)) => {
                    tracing::debug!(elapsed_ms = elapsed_ms(start), "container not found")
                }
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed_ms(start),
                    error = %e,
                    "list failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn last_modified(
        &self,
        container: &str,
        object: &str,
    ) -> Result<DateTime<Utc>, ObjectStoreError> {
        let result = self.inner.last_modified(container, object).await;
        tracing::trace!(container, object, modified = ?result.as_ref().ok(), "looked up");
        result
    }
}

/// Wrapper that adds tracing to any ActivityLog
#[derive(Clone)]
pub struct TracedActivityLog<L> {
    inner: L,
}

impl<L> TracedActivityLog<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<L: ActivityLog> ActivityLog for TracedActivityLog<L> {
    async fn read_since(
        &self,
        container: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<LogRead, ActivityLogError> {
        let span = tracing::info_span!("log.read", container, since = ?since);
        async move {
            let start = Instant::now();
            let result = self.inner.read_since(container, since).await;

            match &result {
                Ok(LogRead::Available(records)) => tracing::debug!(
                    count = records.len(),
                    elapsed_ms = elapsed_ms(start),
                    "read"
                ),
                Ok(LogRead::Unavailable { reason }) => tracing::info!(
                    reason = reason.as_str(),
                    elapsed_ms = elapsed_ms(start),
                    "log unavailable"
                ),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed_ms(start),
                    error = %e,
                    "read failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any TriggerExecutor
#[derive(Clone)]
pub struct TracedExecutor<E> {
    inner: E,
}

impl<E> TracedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: TriggerExecutor> TriggerExecutor for TracedExecutor<E> {
    async fn execute(
        &self,
        locator: &ObjectLocator,
        data: &BindingData,
        cancel: &CancelSignal,
    ) -> Result<bool, ExecutorError> {
        let span = tracing::info_span!("executor.execute", object = %locator);
        async move {
            tracing::info!(params = data.len(), "starting");
            let start = Instant::now();
            let result = self.inner.execute(locator, data, cancel).await;

            match &result {
                Ok(true) => tracing::info!(elapsed_ms = elapsed_ms(start), "succeeded"),
                Ok(false) => tracing::warn!(elapsed_ms = elapsed_ms(start), "failed"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed_ms(start),
                    error = %e,
                    "execution error"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
