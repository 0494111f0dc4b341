// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file
//!
//! ```toml
//! state_dir = "/var/lib/blobwatch"
//!
//! [store]
//! root = "/srv/objects"
//!
//! [activity_log]
//! root = "/srv/objects/$logs"
//!
//! [poll]
//! poll_interval = "10s"
//!
//! [[watch]]
//! container = "input"
//! pattern = "input/{name}.csv"
//! command = "convert \"$BW_OBJECT\""
//! output = "output/{name}.parquet"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use bw_engine::ListenerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "blobwatch.toml";

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "BW_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not determine state directory")]
    NoStateDir,

    #[error("watch #{index} has an empty command")]
    EmptyCommand { index: usize },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Directory whose subdirectories are containers
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityLogSection {
    /// Directory holding analytics `*.log` files
    pub root: PathBuf,
}

/// One `[[watch]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    pub container: String,
    #[serde(default)]
    pub pattern: Option<String>,
    pub command: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    pub store: StoreSection,
    #[serde(default)]
    pub activity_log: Option<ActivityLogSection>,
    #[serde(default)]
    pub poll: ListenerConfig,
    #[serde(default, rename = "watch")]
    pub watches: Vec<WatchConfig>,
}

impl DaemonConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base).map_err(|e| match e {
            ParseFailure::Toml(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Config(e) => e,
        })
    }

    fn parse(content: &str, base: &Path) -> Result<Self, ParseFailure> {
        let mut config: Self = toml::from_str(content).map_err(ParseFailure::Toml)?;

        if let Some(index) = config.watches.iter().position(|w| w.command.trim().is_empty()) {
            return Err(ParseFailure::Config(ConfigError::EmptyCommand { index }));
        }

        config.store.root = resolve(base, &config.store.root);
        if let Some(log) = &mut config.activity_log {
            log.root = resolve(base, &log.root);
        }
        if let Some(dir) = &config.state_dir {
            config.state_dir = Some(resolve(base, dir));
        }
        for watch in &mut config.watches {
            if let Some(cwd) = &watch.cwd {
                watch.cwd = Some(resolve(base, cwd));
            }
        }
        Ok(config)
    }

    /// State directory, falling back to the platform state directory
    pub fn paths(&self) -> Result<Paths, ConfigError> {
        let state_dir = match &self.state_dir {
            Some(dir) => dir.clone(),
            None => default_state_dir()?,
        };
        Ok(Paths::under(state_dir))
    }
}

#[derive(Debug)]
enum ParseFailure {
    Toml(toml::de::Error),
    Config(ConfigError),
}

/// Files the daemon keeps in its state directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub state_dir: PathBuf,
    /// Exclusive lock holding the daemon's PID
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    /// Write-ahead log of scan cursors
    pub cursor_path: PathBuf,
}

impl Paths {
    pub fn under(state_dir: PathBuf) -> Self {
        Self {
            lock_path: state_dir.join("bwd.pid"),
            log_path: state_dir.join("bwd.log"),
            cursor_path: state_dir.join("cursors.wal"),
            state_dir,
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn default_state_dir() -> Result<PathBuf, ConfigError> {
    // XDG state dir on Linux; other platforms fall back to ~/.local/state
    if let Some(dir) = dirs::state_dir() {
        return Ok(dir.join("blobwatch"));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoStateDir)?;
    Ok(home.join(".local/state/blobwatch"))
}

/// Config path from the first argument, then `BW_CONFIG`, then the default file
pub fn config_path(arg: Option<String>) -> PathBuf {
    arg.or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
