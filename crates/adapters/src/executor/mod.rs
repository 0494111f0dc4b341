// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger executors: the work run for each matched object

mod shell;

pub use shell::ShellExecutor;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecCall, FakeExecutor, Outcome};

use async_trait::async_trait;
use bw_core::{BindingData, CancelSignal, ObjectLocator};
use thiserror::Error;

/// Errors from executor invocation
///
/// An error means the attempt did not complete and may be retried. A
/// completed attempt that failed is `Ok(false)`.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to start: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("execution error: {0}")]
    Failed(String),
    #[error("cancelled")]
    Cancelled,
}

/// Runs the registered work for one matched object
///
/// Registrations hold executors as `Arc<dyn TriggerExecutor>`, so unlike the
/// storage adapters this trait is object safe and not `Clone`.
#[async_trait]
pub trait TriggerExecutor: Send + Sync + 'static {
    async fn execute(
        &self,
        locator: &ObjectLocator,
        data: &BindingData,
        cancel: &CancelSignal,
    ) -> Result<bool, ExecutorError>;
}
