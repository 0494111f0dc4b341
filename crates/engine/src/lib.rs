// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! blobwatch change-detection engine
//!
//! Discovers new objects through the activity log and bounded container
//! sweeps, matches them against registrations and drives delivery.

mod budget;
mod config;
mod dedup;
mod error;
mod listener;
mod poller;
mod registry;
mod report;
mod scanner;
mod scheduler;

pub use budget::fair_shares;
pub use config::ListenerConfig;
pub use dedup::DeliveredSet;
pub use error::EngineError;
pub use listener::{ContainerMode, HybridListener, ListenerDeps, ListenerHandle};
pub use poller::{ActivityLogPoller, LogBatch, LogPoll};
pub use registry::{Registration, RegistrationHandle, RegistrationId, Registry};
pub use report::CycleReport;
pub use scanner::{ContainerScanner, ScanPage};
pub use scheduler::run_poll_loop;
