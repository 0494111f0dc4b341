// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: object storage, activity logs, executors

pub mod activity;
pub mod executor;
pub mod store;
pub mod traced;

pub use activity::{
    ActivityLog, ActivityLogError, DisabledActivityLog, FileActivityLog, LogRead, LogRecord,
    OperationKind,
};
pub use executor::{ExecutorError, ShellExecutor, TriggerExecutor};
pub use store::{ListPage, LocalFsStore, ObjectEntry, ObjectStore, ObjectStoreError};
pub use traced::{TracedActivityLog, TracedExecutor, TracedObjectStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use activity::{FakeActivityLog, LogCall};
#[cfg(any(test, feature = "test-support"))]
pub use executor::{ExecCall, FakeExecutor, Outcome};
#[cfg(any(test, feature = "test-support"))]
pub use store::{FakeObjectStore, StoreCall};
