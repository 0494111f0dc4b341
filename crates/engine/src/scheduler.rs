// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer-driven poll loop

use crate::error::EngineError;
use crate::listener::HybridListener;
use crate::report::CycleReport;
use bw_adapters::{ActivityLog, ObjectStore};
use bw_core::{CancelSignal, Clock, IdGen};
use bw_storage::CursorStore;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Run poll cycles on the listener's interval until cancelled
///
/// A corrupt cursor resets that container and the loop carries on; any
/// other cycle error ends the loop.
pub async fn run_poll_loop<S, L, K, C, I>(
    listener: &mut HybridListener<S, L, K, C, I>,
    cancel: &CancelSignal,
) -> Result<(), EngineError>
where
    S: ObjectStore,
    L: ActivityLog,
    K: CursorStore,
    C: Clock,
    I: IdGen,
{
    let period = listener.config().poll_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_ms = period.as_millis() as u64, "poll loop started");
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match listener.poll_cycle(cancel).await {
            Ok(report) => log_report(&report),
            Err(EngineError::CorruptCursor { container, source }) => {
                tracing::error!(container = %container, error = %source, "corrupt cursor, resetting");
                listener.reset_cursor(&container)?;
            }
            Err(e) => return Err(e),
        }

        if cancel.is_cancelled() {
            break;
        }
    }

    tracing::info!(cycles = listener.cycle(), "poll loop stopped");
    Ok(())
}

fn log_report(report: &CycleReport) {
    if report.is_busy() || report.dropped > 0 {
        tracing::info!(
            cycle = report.cycle,
            log_events = report.log_events,
            notifications = report.notifications,
            scanned = report.total_scanned(),
            delivered = report.delivered,
            failed = report.failed,
            errored = report.errored,
            suppressed = report.suppressed,
            retried = report.retried,
            dropped = report.dropped,
            committed = report.committed,
            "poll cycle finished"
        );
    } else {
        tracing::debug!(cycle = report.cycle, "poll cycle idle");
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
