// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake executor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ExecutorError, TriggerExecutor};
use async_trait::async_trait;
use bw_core::{BindingData, CancelSignal, ObjectLocator};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub locator: ObjectLocator,
    pub data: BindingData,
}

/// Scripted result of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `Ok(true)`
    Success,
    /// `Ok(false)`
    Failure,
    /// `Err(ExecutorError::Failed)`
    Error,
}

#[derive(Default)]
struct FakeExecState {
    calls: Vec<ExecCall>,
    queued: HashMap<String, VecDeque<Outcome>>,
}

/// Executor that records calls and answers from a script
///
/// Outcomes queued for an object path are used first; otherwise `Success`.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    inner: Arc<Mutex<FakeExecState>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeExecState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue the outcome of the next invocation for `path` (`container/object`)
    pub fn push_outcome(&self, path: &str, outcome: Outcome) {
        self.state()
            .queued
            .entry(path.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ExecCall> {
        self.state().calls.clone()
    }

    /// Paths of every invocation, in call order
    pub fn paths(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .map(|call| call.locator.path())
            .collect()
    }
}

#[async_trait]
impl TriggerExecutor for FakeExecutor {
    async fn execute(
        &self,
        locator: &ObjectLocator,
        data: &BindingData,
        _cancel: &CancelSignal,
    ) -> Result<bool, ExecutorError> {
        let mut state = self.state();
        state.calls.push(ExecCall {
            locator: locator.clone(),
            data: data.clone(),
        });
        let outcome = state
            .queued
            .get_mut(&locator.path())
            .and_then(VecDeque::pop_front)
            .unwrap_or(Outcome::Success);

        match outcome {
            Outcome::Success => Ok(true),
            Outcome::Failure => Ok(false),
            Outcome::Error => Err(ExecutorError::Failed(format!("scripted error for {}", locator))),
        }
    }
}
