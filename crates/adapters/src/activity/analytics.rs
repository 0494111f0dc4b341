// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for version 1.0 storage analytics log lines
//!
//! Fields are `;`-separated; quoted fields may themselves contain `;`.
//! The columns used here are:
//!
//! | index | field |
//! |---|---|
//! | 0 | log format version (`1.0`) |
//! | 1 | request start time (RFC 3339) |
//! | 2 | operation type |
//! | 10 | service type (`blob`, `table`, `queue`) |
//! | 12 | requested object key, quoted `"/account/container/object"` |

use super::{LogRecord, OperationKind};
use chrono::{DateTime, Utc};
use thiserror::Error;

const VERSION: usize = 0;
const REQUEST_START_TIME: usize = 1;
const OPERATION_TYPE: usize = 2;
const SERVICE_TYPE: usize = 10;
const REQUESTED_OBJECT_KEY: usize = 12;

pub const SUPPORTED_VERSION: &str = "1.0";

/// A line that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogLineError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("invalid request start time '{0}'")]
    InvalidTime(String),
    #[error("invalid object key '{0}'")]
    InvalidKey(String),
}

/// Parse one log line
///
/// Returns `Ok(None)` for lines that are valid but irrelevant: other log
/// format versions, other services, and blank lines.
pub fn parse_line(line: &str) -> Result<Option<LogRecord>, LogLineError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let fields = split_fields(line);
    if fields.get(VERSION).copied().map(unquote) != Some(SUPPORTED_VERSION) {
        return Ok(None);
    }
    if fields.len() <= REQUESTED_OBJECT_KEY {
        return Err(LogLineError::TooFewFields {
            expected: REQUESTED_OBJECT_KEY + 1,
            found: fields.len(),
        });
    }
    if !unquote(fields[SERVICE_TYPE]).eq_ignore_ascii_case("blob") {
        return Ok(None);
    }

    let raw_time = unquote(fields[REQUEST_START_TIME]);
    let timestamp = DateTime::parse_from_rfc3339(raw_time)
        .map_err(|_| LogLineError::InvalidTime(raw_time.to_string()))?
        .with_timezone(&Utc);
    let operation = OperationKind::parse(unquote(fields[OPERATION_TYPE]));
    let (container, object) = parse_object_key(unquote(fields[REQUESTED_OBJECT_KEY]))?;

    Ok(Some(LogRecord {
        timestamp,
        operation,
        container,
        object,
    }))
}

/// Split `/account/container/object` into container and optional object
fn parse_object_key(key: &str) -> Result<(String, Option<String>), LogLineError> {
    let invalid = || LogLineError::InvalidKey(key.to_string());
    let rest = key.strip_prefix('/').ok_or_else(invalid)?;
    let (_account, path) = rest.split_once('/').ok_or_else(invalid)?;
    match path.split_once('/') {
        Some((container, object)) if !container.is_empty() && !object.is_empty() => {
            Ok((container.to_string(), Some(object.to_string())))
        }
        Some((container, _)) if !container.is_empty() => Ok((container.to_string(), None)),
        None if !path.is_empty() => Ok((path.to_string(), None)),
        _ => Err(invalid()),
    }
}

/// Split on `;` outside double quotes
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                fields.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    fields
}

fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod tests;
