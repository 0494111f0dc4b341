// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use bw_adapters::{
    ActivityLog, ActivityLogError, DisabledActivityLog, FileActivityLog, LocalFsStore, LogRead,
    ShellExecutor, TracedActivityLog, TracedExecutor, TracedObjectStore,
};
use bw_core::{ParameterResolvers, PathPattern, PatternError, SystemClock, UuidIdGen};
use bw_engine::{HybridListener, ListenerDeps, RegistrationHandle};
use bw_storage::{StoreError, WalCursorStore};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, DaemonConfig, Paths, WatchConfig};

/// Listener with concrete adapter types (wrapped with tracing)
pub type DaemonListener = HybridListener<
    TracedObjectStore<LocalFsStore>,
    TracedActivityLog<HostLog>,
    WalCursorStore,
    SystemClock,
    UuidIdGen,
>;

/// Activity log chosen by the config file
#[derive(Clone)]
pub enum HostLog {
    File(FileActivityLog),
    Disabled(DisabledActivityLog),
}

impl HostLog {
    fn from_config(config: &DaemonConfig) -> Self {
        match &config.activity_log {
            Some(section) => Self::File(FileActivityLog::new(section.root.clone())),
            None => Self::Disabled(DisabledActivityLog::new()),
        }
    }
}

#[async_trait]
impl ActivityLog for HostLog {
    async fn read_since(
        &self,
        container: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<LogRead, ActivityLogError> {
        match self {
            Self::File(log) => log.read_since(container, since).await,
            Self::Disabled(log) => log.read_since(container, since).await,
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Object store root {0} is not a directory")]
    StoreRootMissing(std::path::PathBuf),

    #[error("Cursor store error: {0}")]
    Cursors(#[from] StoreError),

    #[error("Invalid watch on container '{container}': {source}")]
    Watch {
        container: String,
        #[source]
        source: PatternError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Daemon state during operation
pub struct Daemon {
    pub paths: Paths,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub listener: DaemonListener,
    pub watches: Vec<RegistrationHandle>,
}

impl Daemon {
    /// Shutdown the daemon gracefully
    pub fn shutdown(self) {
        info!("Shutting down daemon...");

        let handle = self.listener.handle();
        for watch in &self.watches {
            handle.unregister(watch);
        }

        if self.paths.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // Lock is released when self.lock_file is dropped
        info!("Daemon shutdown complete");
    }
}

/// Start the daemon
pub fn startup(config: &DaemonConfig, paths: &Paths) -> Result<Daemon, LifecycleError> {
    let lock_file = acquire_lock(paths)?;
    match startup_inner(config, paths, lock_file) {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // Only reached while holding the lock, so the PID file is ours
            cleanup_on_failure(paths);
            Err(e)
        }
    }
}

/// Take the single-instance lock and record our PID in it
fn acquire_lock(paths: &Paths) -> Result<File, LifecycleError> {
    std::fs::create_dir_all(&paths.state_dir)?;

    // Open without truncating so a failed attempt leaves the holder's PID intact
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&paths.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Inner startup logic - cleanup_on_failure called if this fails
fn startup_inner(
    config: &DaemonConfig,
    paths: &Paths,
    lock_file: File,
) -> Result<Daemon, LifecycleError> {
    // Validate the store before touching cursors
    if !config.store.root.is_dir() {
        return Err(LifecycleError::StoreRootMissing(config.store.root.clone()));
    }

    let cursors = WalCursorStore::open(&paths.cursor_path)?;
    let log = HostLog::from_config(config);
    if matches!(log, HostLog::Disabled(_)) {
        info!("No activity log configured; containers will be swept");
    }

    let listener = HybridListener::new(
        ListenerDeps {
            store: TracedObjectStore::new(LocalFsStore::new(config.store.root.clone())),
            log: TracedActivityLog::new(log),
            cursors,
        },
        config.poll.clone(),
        SystemClock,
        UuidIdGen,
    );

    let resolvers = Arc::new(ParameterResolvers::builtin(SystemClock));
    let handle = listener.handle();
    let mut watches = Vec::with_capacity(config.watches.len());
    for watch in &config.watches {
        let executor = build_executor(watch, &resolvers)?;
        let registration = handle
            .register(&watch.container, watch.pattern.as_deref(), executor)
            .map_err(|source| LifecycleError::Watch {
                container: watch.container.clone(),
                source,
            })?;
        info!(
            container = %watch.container,
            registration = %registration.id,
            pattern = watch.pattern.as_deref().unwrap_or("*"),
            "watch registered"
        );
        watches.push(registration);
    }
    if watches.is_empty() {
        warn!("No watches configured; nothing will be triggered");
    }

    info!(
        store = %config.store.root.display(),
        watches = watches.len(),
        "Daemon started"
    );

    Ok(Daemon {
        paths: paths.clone(),
        lock_file,
        listener,
        watches,
    })
}

fn build_executor(
    watch: &WatchConfig,
    resolvers: &Arc<ParameterResolvers>,
) -> Result<Arc<TracedExecutor<ShellExecutor>>, LifecycleError> {
    let mut shell = ShellExecutor::new(watch.command.clone());
    if let Some(output) = &watch.output {
        let pattern = PathPattern::parse_with(output, Arc::clone(resolvers)).map_err(|source| {
            LifecycleError::Watch {
                container: watch.container.clone(),
                source,
            }
        })?;
        shell = shell.with_output(pattern);
    }
    if let Some(cwd) = &watch.cwd {
        shell = shell.with_cwd(cwd.clone());
    }
    Ok(Arc::new(TracedExecutor::new(shell)))
}

/// Clean up resources on startup failure
fn cleanup_on_failure(paths: &Paths) {
    if paths.lock_path.exists() {
        let _ = std::fs::remove_file(&paths.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
