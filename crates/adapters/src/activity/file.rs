// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity log read from analytics log files on disk
//!
//! Files follow the storage analytics layout `YYYY/MM/DD/HH00/nnnnnn.log`
//! below the root. Hour directories that end before the requested time
//! are skipped; files outside that layout are always read.

use super::analytics::parse_line;
use super::{ActivityLog, ActivityLogError, LogRead, LogRecord};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Analytics log files under a directory
#[derive(Clone)]
pub struct FileActivityLog {
    root: PathBuf,
}

impl FileActivityLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ActivityLog for FileActivityLog {
    async fn read_since(
        &self,
        container: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<LogRead, ActivityLogError> {
        if !self.root.is_dir() {
            return Ok(LogRead::Unavailable {
                reason: format!("no activity log directory at {}", self.root.display()),
            });
        }

        let root = self.root.clone();
        let container = container.to_string();
        tokio::task::spawn_blocking(move || -> Result<LogRead, ActivityLogError> {
            let mut files = Vec::new();
            collect_logs(&root, &mut files)?;
            files.sort();

            let mut records = Vec::new();
            for file in files {
                if let (Some(since), Some(hour)) = (since, hour_of(&root, &file)) {
                    if hour + TimeDelta::hours(1) <= since {
                        continue;
                    }
                }
                read_file(&file, &container, since, &mut records)?;
            }
            Ok(LogRead::Available(records))
        })
        .await
        .map_err(|e| ActivityLogError::Io(io::Error::other(e)))?
    }
}

fn collect_logs(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_logs(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "log") {
            out.push(path);
        }
    }
    Ok(())
}

/// Start of the hour a log file covers, from its `YYYY/MM/DD/HH00` parent dirs
fn hour_of(root: &Path, file: &Path) -> Option<DateTime<Utc>> {
    let relative = file.parent()?.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let [.., year, month, day, hour] = parts.as_slice() else {
        return None;
    };
    let hour = hour.strip_suffix("00")?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?
        .and_hms_opt(hour.parse().ok()?, 0, 0)
        .map(|naive| naive.and_utc())
}

fn read_file(
    path: &Path,
    container: &str,
    since: Option<DateTime<Utc>>,
    out: &mut Vec<LogRecord>,
) -> io::Result<()> {
    let mut reader = BufReader::new(std::fs::File::open(path)?);
    let mut buf = Vec::new();
    let mut index = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        index += 1;
        let bytes = buf.strip_suffix(b"\n").unwrap_or(&buf);
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        let Ok(line) = std::str::from_utf8(bytes) else {
            tracing::warn!(
                file = %path.display(),
                line = index,
                "skipping log line that is not UTF-8"
            );
            continue;
        };
        match parse_line(line) {
            Ok(Some(record)) => {
                if record.container == container && since.is_none_or(|t| record.timestamp >= t) {
                    out.push(record);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    file = %path.display(),
                    line = index,
                    error = %e,
                    "skipping malformed log line"
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
