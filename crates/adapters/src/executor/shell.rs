// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor that runs a shell command per matched object

use super::{ExecutorError, TriggerExecutor};
use async_trait::async_trait;
use bw_core::{BindingData, CancelSignal, ObjectLocator, PathPattern};
use std::path::PathBuf;
use tokio::process::Command;

pub const ENV_CONTAINER: &str = "BW_CONTAINER";
pub const ENV_OBJECT: &str = "BW_OBJECT";
pub const ENV_OUTPUT: &str = "BW_OUTPUT";
pub const ENV_PARAM_PREFIX: &str = "BW_PARAM_";

/// Runs `sh -c <command>` with the object and its captures in the environment
#[derive(Clone)]
pub struct ShellExecutor {
    command: String,
    output: Option<PathPattern>,
    cwd: Option<PathBuf>,
}

impl ShellExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output: None,
            cwd: None,
        }
    }

    /// Render this pattern from the captures and export it as `BW_OUTPUT`
    pub fn with_output(mut self, output: PathPattern) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Environment for one invocation, or `None` when the output path cannot be rendered
    fn environment(
        &self,
        locator: &ObjectLocator,
        data: &BindingData,
    ) -> Option<Vec<(String, String)>> {
        let mut env = vec![(ENV_CONTAINER.to_string(), locator.container.clone())];
        if let Some(object) = &locator.object {
            env.push((ENV_OBJECT.to_string(), object.clone()));
        }
        for (name, value) in data {
            env.push((param_var(name), value.clone()));
        }
        if let Some(output) = &self.output {
            match output.render(data) {
                Ok(path) => env.push((ENV_OUTPUT.to_string(), path)),
                Err(e) => {
                    tracing::warn!(
                        object = %locator,
                        error = %e,
                        "cannot render output path"
                    );
                    return None;
                }
            }
        }
        Some(env)
    }
}

/// `BW_PARAM_<NAME>`, upper-cased with non-alphanumerics replaced by `_`
pub fn param_var(name: &str) -> String {
    let suffix: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", ENV_PARAM_PREFIX, suffix)
}

#[async_trait]
impl TriggerExecutor for ShellExecutor {
    async fn execute(
        &self,
        locator: &ObjectLocator,
        data: &BindingData,
        cancel: &CancelSignal,
    ) -> Result<bool, ExecutorError> {
        // A pattern that cannot be rendered will not render on retry either
        let Some(env) = self.environment(locator, data) else {
            return Ok(false);
        };

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.command).envs(env).kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(ExecutorError::Spawn)?;
        match cancel.run(child.wait()).await {
            Some(status) => {
                let status = status.map_err(ExecutorError::Spawn)?;
                if !status.success() {
                    tracing::debug!(
                        object = %locator,
                        code = ?status.code(),
                        "command exited non-zero"
                    );
                }
                Ok(status.success())
            }
            None => Err(ExecutorError::Cancelled),
        }
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
