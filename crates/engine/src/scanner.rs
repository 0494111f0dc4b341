// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded enumeration of a container

use bw_adapters::{ObjectStore, ObjectStoreError};
use bw_core::{CancelSignal, Clock, EventSource, ObjectLocator, PendingEvent, SweepState};

/// Largest page requested from the store in one listing call
const MAX_PAGE: usize = 5000;

/// Result of one bounded scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    /// Objects newer than the sweep watermark, in listing order
    pub events: Vec<PendingEvent>,
    /// Sweep position to resume from
    pub next: SweepState,
    pub inspected: usize,
    /// True when this scan finished the sweep
    pub complete: bool,
}

/// Walks a container a page at a time, resuming where the last scan stopped
#[derive(Clone)]
pub struct ContainerScanner<S, C> {
    store: S,
    clock: C,
}

impl<S: ObjectStore, C: Clock> ContainerScanner<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Inspect at most `limit` objects, continuing the sweep in `state`
    ///
    /// A container that does not exist yields an empty, complete page.
    /// Cancellation stops between pages and returns what was inspected.
    pub async fn scan(
        &self,
        container: &str,
        prefix: Option<&str>,
        state: &SweepState,
        limit: usize,
        cancel: &CancelSignal,
    ) -> Result<ScanPage, ObjectStoreError> {
        let mut page = ScanPage {
            events: Vec::new(),
            next: state.clone(),
            inspected: 0,
            complete: false,
        };

        while page.inspected < limit {
            let want = (limit - page.inspected).min(MAX_PAGE);
            let requested_at = self.clock.now();
            let listing = self.store.list(
                container,
                prefix,
                page.next.continuation.as_deref(),
                want,
            );
            let Some(result) = cancel.run(listing).await else {
                break;
            };
            let listed = match result {
                Ok(listed) => listed,
                Err(ObjectStoreError::ContainerNotFound(_)) => {
                    tracing::debug!(container, "container not found, nothing to scan");
                    page.next.complete();
                    page.complete = true;
                    break;
                }
                Err(e) => return Err(e),
            };

            page.next.begin(requested_at);
            let observed_at = self.clock.now();
            for entry in listed.objects {
                page.inspected += 1;
                if state.is_new(entry.last_modified) {
                    page.events.push(PendingEvent::new(
                        ObjectLocator::new(container, entry.name),
                        observed_at,
                        Some(entry.last_modified),
                        EventSource::Scan,
                    ));
                }
                page.next.observe(entry.last_modified);
            }

            page.next.continuation = listed.next;
            if page.next.continuation.is_none() {
                page.next.complete();
                page.complete = true;
                break;
            }
        }

        Ok(page)
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
