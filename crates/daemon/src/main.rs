// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blobwatch Daemon (bwd)
//!
//! Background process that polls object storage and runs watch commands.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod lifecycle;

use bw_core::CancelSource;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::config::{DaemonConfig, Paths};
use crate::lifecycle::LifecycleError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::config_path(std::env::args().nth(1));
    let config = DaemonConfig::load(&config_path)?;
    let paths = config.paths()?;

    // Write startup marker to log (before tracing setup, so operators can find it)
    write_startup_marker(&paths)?;

    let log_guard = setup_logging(&paths)?;

    info!("Starting bwd with config {}", config_path.display());

    let mut daemon = match lifecycle::startup(&config, &paths) {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&paths, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let cancel = CancelSource::new();
    let stop = cancel.signal();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
        }
        cancel.cancel();
    });

    info!("Daemon ready, watching {}", config.store.root.display());

    // Signal ready for a supervising process
    println!("READY");

    // Cancellation lets the current cycle persist what it finished
    let result = bw_engine::run_poll_loop(&mut daemon.listener, &stop).await;
    if let Err(e) = &result {
        error!("Poll loop failed: {}", e);
    }
    daemon.shutdown();

    info!("Daemon stopped");
    drop(log_guard);
    result.map_err(Into::into)
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- bwd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- bwd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(paths: &Paths) -> Result<(), LifecycleError> {
    use std::io::Write;

    std::fs::create_dir_all(&paths.state_dir)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(paths: &Paths, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    paths: &Paths,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&paths.state_dir)?;

    let file_name = paths
        .log_path
        .file_name()
        .ok_or(config::ConfigError::NoStateDir)?;
    let file_appender = tracing_appender::rolling::never(&paths.state_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
