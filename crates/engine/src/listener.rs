// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hybrid listener: activity log first, bounded sweeps as the safety net
//!
//! One [`HybridListener::poll_cycle`] call reads every watched container's
//! log in parallel, runs the sweeps that are due under a shared budget, then
//! delivers and commits container by container. Cursor and dedup state are
//! only touched from the cycle itself, never from the spawned reads.

use crate::budget::fair_shares;
use crate::config::ListenerConfig;
use crate::dedup::DeliveredSet;
use crate::error::EngineError;
use crate::poller::{ActivityLogPoller, LogBatch, LogPoll};
use crate::registry::{
    scan_prefix, Registration, RegistrationHandle, RegistrationId, Registry, Snapshot,
};
use crate::report::CycleReport;
use crate::scanner::ContainerScanner;
use bw_adapters::{ActivityLog, ObjectStore, ObjectStoreError, TriggerExecutor};
use bw_core::{
    CancelSignal, Clock, EventSource, IdGen, ObjectLocator, ParameterResolvers, PatternError,
    PendingEvent, ScanCursor, SweepState,
};
use bw_storage::{CursorStore, StoreError};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::Instrument;

/// How a container's new objects are currently discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerMode {
    /// The log has not answered yet
    Uninitialized,
    LogPolling,
    /// The last log read failed; sweeping until it recovers
    ScanFallback,
    /// The log was unavailable on first contact; sweeps only from now on
    ScanOnly,
}

/// External collaborators of a listener
pub struct ListenerDeps<S, L, K> {
    pub store: S,
    pub log: L,
    pub cursors: K,
}

/// Cheap handle for registering interest while the listener runs
pub struct ListenerHandle<I: IdGen> {
    registry: Registry<I>,
    notifications: Arc<Mutex<Vec<ObjectLocator>>>,
}

impl<I: IdGen> Clone for ListenerHandle<I> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            notifications: Arc::clone(&self.notifications),
        }
    }
}

impl<I: IdGen> ListenerHandle<I> {
    /// Attach `executor` to `container`, filtered by `pattern` when given
    pub fn register(
        &self,
        container: &str,
        pattern: Option<&str>,
        executor: Arc<dyn TriggerExecutor>,
    ) -> Result<RegistrationHandle, PatternError> {
        self.registry.register(container, pattern, executor)
    }

    pub fn unregister(&self, handle: &RegistrationHandle) -> bool {
        self.registry.unregister(handle)
    }

    /// Announce an object the host wrote itself
    ///
    /// Delivered on the next cycle without waiting for the log or a sweep.
    pub fn notify_written(&self, locator: ObjectLocator) {
        if locator.object.is_none() || !self.registry.is_watched(&locator.container) {
            tracing::debug!(object = %locator, "ignoring write notification");
            return;
        }
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(locator);
    }
}

struct ContainerState {
    mode: ContainerMode,
    /// Progress including everything delivered so far
    cursor: ScanCursor,
    /// Last cursor written to the store
    saved: ScanCursor,
}

/// An errored delivery waiting for the next cycle
struct RetryEntry {
    registration: RegistrationId,
    event: PendingEvent,
    attempts: u32,
}

enum LogOutcome {
    Read(LogBatch),
    Unavailable(String),
    Failed,
}

struct ScanWork {
    sweep: SweepState,
    events: Vec<PendingEvent>,
    /// At least one bounded scan succeeded this cycle
    ran: bool,
}

/// Watches every registered container and drives deliveries
pub struct HybridListener<S, L, K, C: Clock, I: IdGen> {
    scanner: ContainerScanner<S, C>,
    poller: ActivityLogPoller<L>,
    store: S,
    cursors: K,
    clock: C,
    config: ListenerConfig,
    registry: Registry<I>,
    notifications: Arc<Mutex<Vec<ObjectLocator>>>,
    containers: HashMap<String, ContainerState>,
    delivered: HashMap<RegistrationId, DeliveredSet>,
    retries: Vec<RetryEntry>,
    cycle: u64,
    rotation: usize,
}

impl<S, L, K, C, I> HybridListener<S, L, K, C, I>
where
    S: ObjectStore,
    L: ActivityLog,
    K: CursorStore,
    C: Clock,
    I: IdGen,
{
    pub fn new(deps: ListenerDeps<S, L, K>, config: ListenerConfig, clock: C, id_gen: I) -> Self {
        let resolvers = Arc::new(ParameterResolvers::builtin(clock.clone()));
        Self {
            scanner: ContainerScanner::new(deps.store.clone(), clock.clone()),
            poller: ActivityLogPoller::new(deps.log, config.log_safety_margin),
            store: deps.store,
            cursors: deps.cursors,
            clock,
            config,
            registry: Registry::new(id_gen, resolvers),
            notifications: Arc::new(Mutex::new(Vec::new())),
            containers: HashMap::new(),
            delivered: HashMap::new(),
            retries: Vec::new(),
            cycle: 0,
            rotation: 0,
        }
    }

    pub fn handle(&self) -> ListenerHandle<I> {
        ListenerHandle {
            registry: self.registry.clone(),
            notifications: Arc::clone(&self.notifications),
        }
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Cycles started so far
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn mode(&self, container: &str) -> Option<ContainerMode> {
        self.containers.get(container).map(|state| state.mode)
    }

    /// In-memory progress for a container, ahead of what may be persisted
    pub fn cursor(&self, container: &str) -> Option<&ScanCursor> {
        self.containers.get(container).map(|state| &state.cursor)
    }

    pub fn pending_retries(&self) -> usize {
        self.retries.len()
    }

    /// Forget a container's progress; it restarts from the beginning
    pub fn reset_cursor(&mut self, container: &str) -> Result<(), EngineError> {
        self.cursors.reset(container)?;
        self.containers.remove(container);
        tracing::warn!(container, "cursor reset");
        Ok(())
    }

    /// Run one poll cycle
    ///
    /// Errors only for corrupt persisted state; transient I/O failures are
    /// logged and leave the affected cursor where it was.
    pub async fn poll_cycle(&mut self, cancel: &CancelSignal) -> Result<CycleReport, EngineError> {
        self.cycle += 1;
        let span = tracing::info_span!("poll_cycle", cycle = self.cycle);
        self.run_cycle(cancel).instrument(span).await
    }

    async fn run_cycle(&mut self, cancel: &CancelSignal) -> Result<CycleReport, EngineError> {
        let mut report = CycleReport::new(self.cycle);
        let snapshot = self.registry.snapshot();
        self.prune(&snapshot);

        let mut ready = Vec::new();
        for container in snapshot.keys() {
            if self.load(container)? {
                ready.push(container.clone());
            }
        }

        let mut notified = self.take_notifications(&ready, cancel, &mut report).await;
        let mut logs = self.read_logs(&ready, cancel).await;
        let due = self.advance_modes(&ready, &logs);
        let mut scans = self.run_scans(&due, &snapshot, cancel, &mut report).await;
        self.rotation = self.rotation.wrapping_add(1);

        for container in &ready {
            if cancel.is_cancelled() {
                break;
            }
            let Some(registrations) = snapshot.get(container) else {
                continue;
            };

            let (log_events, log_watermark) = match logs.remove(container) {
                Some(LogOutcome::Read(batch)) => (batch.events, Some(batch.next_watermark)),
                _ => (Vec::new(), None),
            };
            let (scan_events, sweep) = match scans.remove(container) {
                Some(work) if work.ran => (work.events, Some(work.sweep)),
                _ => (Vec::new(), None),
            };
            report.log_events += log_events.len();

            // Oldest first: log entries predate notifications, which predate this sweep
            let mut events = log_events;
            events.extend(notified.remove(container).unwrap_or_default());
            events.extend(scan_events);

            if !self
                .deliver_container(container, registrations, &events, cancel, &mut report)
                .await
            {
                break;
            }
            self.commit(container, log_watermark, sweep, &mut report);
        }

        report.cancelled = cancel.is_cancelled();
        Ok(report)
    }

    /// Drop state belonging to containers and registrations that are gone
    fn prune(&mut self, snapshot: &Snapshot) {
        self.containers
            .retain(|container, _| snapshot.contains_key(container));
        let live: HashSet<&RegistrationId> =
            snapshot.values().flatten().map(|r| &r.id).collect();
        self.delivered.retain(|id, _| live.contains(id));
        self.retries
            .retain(|retry| live.contains(&retry.registration));
    }

    /// Load a container's cursor on first sight; false when the store failed
    fn load(&mut self, container: &str) -> Result<bool, EngineError> {
        if self.containers.contains_key(container) {
            return Ok(true);
        }
        match self.cursors.load(container) {
            Ok(cursor) => {
                let cursor = cursor.unwrap_or_default();
                self.containers.insert(
                    container.to_string(),
                    ContainerState {
                        mode: ContainerMode::Uninitialized,
                        saved: cursor.clone(),
                        cursor,
                    },
                );
                Ok(true)
            }
            Err(source @ StoreError::Corrupt { .. }) => Err(EngineError::CorruptCursor {
                container: container.to_string(),
                source,
            }),
            Err(e) => {
                tracing::warn!(container, error = %e, "failed to load cursor, skipping container");
                Ok(false)
            }
        }
    }

    async fn take_notifications(
        &self,
        ready: &[String],
        cancel: &CancelSignal,
        report: &mut CycleReport,
    ) -> HashMap<String, Vec<PendingEvent>> {
        let drained = std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );

        let mut events: HashMap<String, Vec<PendingEvent>> = HashMap::new();
        let mut deferred = Vec::new();
        for locator in drained {
            if !ready.contains(&locator.container) {
                if self.registry.is_watched(&locator.container) {
                    deferred.push(locator);
                }
                continue;
            }
            let Some(object) = locator.object.clone() else {
                continue;
            };
            report.notifications += 1;

            let lookup = cancel
                .run(self.store.last_modified(&locator.container, &object))
                .await;
            let version = match lookup {
                Some(Ok(version)) => Some(version),
                Some(Err(
                    ObjectStoreError::ObjectNotFound { .. } | ObjectStoreError::ContainerNotFound(_),
                )) => {
                    tracing::debug!(object = %locator, "notified object is gone");
                    continue;
                }
                Some(Err(e)) => {
                    tracing::warn!(object = %locator, error = %e, "version lookup failed");
                    None
                }
                None => None,
            };
            events
                .entry(locator.container.clone())
                .or_default()
                .push(PendingEvent::new(
                    locator,
                    self.clock.now(),
                    version,
                    EventSource::Notification,
                ));
        }

        if !deferred.is_empty() {
            self.notifications
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .extend(deferred);
        }
        events
    }

    /// Read every log-polled container's log concurrently
    async fn read_logs(
        &self,
        ready: &[String],
        cancel: &CancelSignal,
    ) -> HashMap<String, LogOutcome> {
        let mut reads = JoinSet::new();
        for container in ready {
            let Some(state) = self.containers.get(container) else {
                continue;
            };
            if state.mode == ContainerMode::ScanOnly {
                continue;
            }
            let poller = self.poller.clone();
            let store = self.store.clone();
            let cancel = cancel.clone();
            let container = container.clone();
            let watermark = state.cursor.log_watermark;
            reads.spawn(
                async move {
                    let outcome = cancel
                        .run(read_log(&poller, &store, &container, watermark))
                        .await;
                    (container, outcome)
                }
                .in_current_span(),
            );
        }

        let mut outcomes = HashMap::new();
        while let Some(joined) = reads.join_next().await {
            match joined {
                Ok((container, Some(outcome))) => {
                    outcomes.insert(container, outcome);
                }
                Ok((_, None)) => {}
                Err(e) => tracing::warn!(error = %e, "log read task failed"),
            }
        }
        outcomes
    }

    /// Apply log results to each container's mode; returns containers to sweep
    fn advance_modes(
        &mut self,
        ready: &[String],
        logs: &HashMap<String, LogOutcome>,
    ) -> Vec<String> {
        let sweep_due = self.config.sweep_due(self.cycle);
        let mut due = Vec::new();

        for container in ready {
            let Some(state) = self.containers.get_mut(container) else {
                continue;
            };
            let fallback = match (state.mode, logs.get(container)) {
                (ContainerMode::ScanOnly, _) => true,
                (_, Some(LogOutcome::Read(_))) => {
                    if state.mode == ContainerMode::ScanFallback {
                        tracing::info!(container = %container, "activity log recovered");
                    }
                    state.mode = ContainerMode::LogPolling;
                    false
                }
                (ContainerMode::Uninitialized, Some(LogOutcome::Unavailable(reason))) => {
                    tracing::info!(
                        container = %container,
                        reason = %reason,
                        "activity log unavailable, scanning only"
                    );
                    state.mode = ContainerMode::ScanOnly;
                    true
                }
                (_, Some(LogOutcome::Unavailable(reason))) => {
                    tracing::warn!(
                        container = %container,
                        reason = %reason,
                        "activity log unavailable, scanning this cycle"
                    );
                    state.mode = ContainerMode::ScanFallback;
                    true
                }
                (ContainerMode::Uninitialized, _) => true,
                (_, Some(LogOutcome::Failed) | None) => {
                    state.mode = ContainerMode::ScanFallback;
                    true
                }
            };
            if fallback || sweep_due {
                due.push(container.clone());
            }
        }
        due
    }

    /// Run due sweeps, sharing the scan budget fairly over several rounds
    async fn run_scans(
        &self,
        due: &[String],
        snapshot: &Snapshot,
        cancel: &CancelSignal,
        report: &mut CycleReport,
    ) -> HashMap<String, ScanWork> {
        let mut work: HashMap<String, ScanWork> = due
            .iter()
            .filter_map(|container| {
                let state = self.containers.get(container)?;
                Some((
                    container.clone(),
                    ScanWork {
                        sweep: state.cursor.sweep.clone(),
                        events: Vec::new(),
                        ran: false,
                    },
                ))
            })
            .collect();
        let mut active: Vec<String> = due.to_vec();
        let mut budget = self.config.scan_budget;

        for round in 0..self.config.max_budget_rounds.max(1) {
            if budget == 0 || active.is_empty() || cancel.is_cancelled() {
                break;
            }
            // Later rounds hand leftovers to sweeps that used their whole share
            let demands: Vec<Option<usize>> = active
                .iter()
                .map(|container| {
                    work.get(container)
                        .filter(|_| round == 0)
                        .and_then(|w| w.sweep.remaining_estimate())
                        .map(|n| usize::try_from(n).unwrap_or(usize::MAX).max(1))
                })
                .collect();
            let shares = fair_shares(budget, &demands, self.rotation);

            let mut scans = JoinSet::new();
            let mut next_active = Vec::new();
            for (container, share) in active.iter().zip(shares) {
                let Some(w) = work.get(container) else {
                    continue;
                };
                if share == 0 {
                    next_active.push(container.clone());
                    continue;
                }
                let scanner = self.scanner.clone();
                let cancel = cancel.clone();
                let container = container.clone();
                let prefix = snapshot.get(&container).and_then(|r| scan_prefix(r));
                let sweep = w.sweep.clone();
                scans.spawn(
                    async move {
                        let result = scanner
                            .scan(&container, prefix.as_deref(), &sweep, share, &cancel)
                            .await;
                        (container, share, result)
                    }
                    .in_current_span(),
                );
            }

            while let Some(joined) = scans.join_next().await {
                let (container, share, result) = match joined {
                    Ok(out) => out,
                    Err(e) => {
                        tracing::warn!(error = %e, "scan task failed");
                        continue;
                    }
                };
                let Some(w) = work.get_mut(&container) else {
                    continue;
                };
                match result {
                    Ok(page) => {
                        budget = budget.saturating_sub(page.inspected);
                        *report.scanned.entry(container.clone()).or_default() += page.inspected;
                        w.sweep = page.next;
                        w.events.extend(page.events);
                        w.ran = true;
                        if !page.complete && page.inspected >= share {
                            next_active.push(container);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(container = %container, error = %e, "scan failed");
                    }
                }
            }

            next_active.sort();
            active = next_active;
        }

        work
    }

    /// Deliver queued retries, then this cycle's events, for one container
    ///
    /// Returns false when cancellation stopped delivery part way.
    async fn deliver_container(
        &mut self,
        container: &str,
        registrations: &[Arc<Registration>],
        events: &[PendingEvent],
        cancel: &CancelSignal,
        report: &mut CycleReport,
    ) -> bool {
        let (mine, rest): (Vec<RetryEntry>, Vec<RetryEntry>) = std::mem::take(&mut self.retries)
            .into_iter()
            .partition(|retry| retry.event.container() == container);
        self.retries = rest;

        let mut retries = mine.into_iter();
        while let Some(retry) = retries.next() {
            if cancel.is_cancelled() {
                self.retries.push(retry);
                self.retries.extend(retries);
                return false;
            }
            let Some(registration) = registrations.iter().find(|r| r.id == retry.registration)
            else {
                continue;
            };
            report.retried += 1;
            self.deliver(registration, &retry.event, retry.attempts, cancel, report)
                .await;
        }

        for event in events {
            if cancel.is_cancelled() {
                return false;
            }
            for registration in registrations {
                self.deliver(registration, event, 0, cancel, report).await;
            }
        }
        true
    }

    /// Run one registration's executor for one event, at most once per version
    async fn deliver(
        &mut self,
        registration: &Registration,
        event: &PendingEvent,
        attempts: u32,
        cancel: &CancelSignal,
        report: &mut CycleReport,
    ) {
        let Some(data) = registration.matches(&event.locator) else {
            return;
        };
        let key = event.delivery_key();
        let queued = self
            .retries
            .iter()
            .any(|r| r.registration == registration.id && r.event.delivery_key() == key);
        let now = self.clock.now();
        let (capacity, ttl) = (self.config.dedup_capacity, self.config.dedup_ttl);
        let seen = self
            .delivered
            .entry(registration.id.clone())
            .or_insert_with(|| DeliveredSet::new(capacity, ttl))
            .contains(&key, now);
        if queued || seen {
            report.suppressed += 1;
            tracing::debug!(
                registration = %registration.id,
                object = %event.locator,
                "already delivered"
            );
            return;
        }

        let outcome = registration
            .executor
            .execute(&event.locator, &data, cancel)
            .await;
        match outcome {
            Ok(succeeded) => {
                if succeeded {
                    report.delivered += 1;
                } else {
                    report.failed += 1;
                    tracing::warn!(
                        registration = %registration.id,
                        object = %event.locator,
                        source = %event.source,
                        "executor reported failure"
                    );
                }
                let now = self.clock.now();
                self.delivered
                    .entry(registration.id.clone())
                    .or_insert_with(|| DeliveredSet::new(capacity, ttl))
                    .insert(key, now);
            }
            Err(e) => {
                report.errored += 1;
                let attempts = attempts + 1;
                if attempts < self.config.max_delivery_attempts {
                    tracing::warn!(
                        registration = %registration.id,
                        object = %event.locator,
                        attempts,
                        error = %e,
                        "delivery errored, retrying next cycle"
                    );
                    self.retries.push(RetryEntry {
                        registration: registration.id.clone(),
                        event: event.clone(),
                        attempts,
                    });
                } else {
                    report.dropped += 1;
                    tracing::error!(
                        registration = %registration.id,
                        object = %event.locator,
                        attempts,
                        error = %e,
                        "delivery errored too often, dropping"
                    );
                    // Later sightings of this version are suppressed like a delivery
                    let now = self.clock.now();
                    self.delivered
                        .entry(registration.id.clone())
                        .or_insert_with(|| DeliveredSet::new(capacity, ttl))
                        .insert(key, now);
                }
            }
        }
    }

    /// Advance a container's cursor and persist it
    ///
    /// The persisted copy stays behind any event still queued for retry so
    /// a restart delivers it again.
    fn commit(
        &mut self,
        container: &str,
        log_watermark: Option<Option<DateTime<Utc>>>,
        sweep: Option<SweepState>,
        report: &mut CycleReport,
    ) {
        let Some(state) = self.containers.get_mut(container) else {
            return;
        };
        if let Some(watermark) = log_watermark {
            state.cursor.log_watermark = watermark;
        }
        if let Some(sweep) = sweep {
            state.cursor.sweep = sweep;
        }

        let mut persisted = state.cursor.clone();
        for retry in self
            .retries
            .iter()
            .filter(|retry| retry.event.container() == container)
        {
            match (retry.event.source, retry.event.version) {
                (EventSource::Log, _) => persisted.clamp_log_watermark(retry.event.observed_at),
                (_, Some(version)) => persisted.sweep.rewind_before(version),
                (_, None) => {}
            }
        }
        if persisted == state.saved {
            return;
        }

        match self.cursors.save(container, &persisted) {
            Ok(()) => {
                tracing::debug!(container, "cursor saved");
                state.saved = persisted;
                report.committed += 1;
            }
            Err(e) => {
                tracing::warn!(container, error = %e, "failed to save cursor");
            }
        }
    }
}

async fn read_log<L: ActivityLog, S: ObjectStore>(
    poller: &ActivityLogPoller<L>,
    store: &S,
    container: &str,
    watermark: Option<DateTime<Utc>>,
) -> LogOutcome {
    match poller.poll(container, watermark).await {
        Ok(LogPoll::Events(mut batch)) => {
            batch.events = resolve_versions(store, batch.events).await;
            LogOutcome::Read(batch)
        }
        Ok(LogPoll::Unavailable { reason }) => LogOutcome::Unavailable(reason),
        Err(e) => {
            tracing::warn!(container, error = %e, "activity log read failed");
            LogOutcome::Failed
        }
    }
}

/// Attach last-modified versions to log events, dropping deleted objects
async fn resolve_versions<S: ObjectStore>(
    store: &S,
    events: Vec<PendingEvent>,
) -> Vec<PendingEvent> {
    let mut resolved = Vec::with_capacity(events.len());
    for mut event in events {
        let Some(object) = event.object().map(str::to_string) else {
            continue;
        };
        let lookup = store.last_modified(event.container(), &object).await;
        match lookup {
            Ok(version) => event.version = Some(version),
            Err(ObjectStoreError::ObjectNotFound { .. } | ObjectStoreError::ContainerNotFound(_)) => {
                tracing::debug!(object = %event.locator, "logged object is gone");
                continue;
            }
            Err(e) => {
                tracing::warn!(object = %event.locator, error = %e, "version lookup failed, using log time");
                event.version = Some(event.observed_at);
            }
        }
        resolved.push(event);
    }
    resolved
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
