// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object locators and storage naming rules

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const CONTAINER_NAME_MIN: usize = 3;
pub const CONTAINER_NAME_MAX: usize = 63;
pub const OBJECT_NAME_MAX: usize = 1024;

/// A name rejected by the storage naming rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid name '{name}': {reason}")]
pub struct NameError {
    pub name: String,
    pub reason: &'static str,
}

impl NameError {
    fn new(name: &str, reason: &'static str) -> Self {
        Self {
            name: name.to_string(),
            reason,
        }
    }
}

/// Check a container name: 3-63 chars of lowercase letters, digits and
/// single internal hyphens.
pub fn validate_container_name(name: &str) -> Result<(), NameError> {
    let len = name.chars().count();
    if !(CONTAINER_NAME_MIN..=CONTAINER_NAME_MAX).contains(&len) {
        return Err(NameError::new(name, "container names must be 3-63 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(NameError::new(
            name,
            "container names may only contain lowercase letters, digits and hyphens",
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(NameError::new(
            name,
            "container names must start and end with a letter or digit",
        ));
    }
    if name.contains("--") {
        return Err(NameError::new(
            name,
            "container names may not contain consecutive hyphens",
        ));
    }
    Ok(())
}

/// Check an object name: 1-1024 chars, not ending in `.` or `/`.
pub fn validate_object_name(name: &str) -> Result<(), NameError> {
    let len = name.chars().count();
    if len == 0 || len > OBJECT_NAME_MAX {
        return Err(NameError::new(name, "object names must be 1-1024 characters"));
    }
    if name.ends_with('.') || name.ends_with('/') {
        return Err(NameError::new(name, "object names may not end with '.' or '/'"));
    }
    Ok(())
}

/// Split a path at its first `/` into container and object parts
pub fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('/') {
        Some((container, object)) => (container, Some(object)),
        None => (path, None),
    }
}

/// Identifies an object, or a whole container when `object` is `None`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectLocator {
    pub container: String,
    pub object: Option<String>,
}

impl ObjectLocator {
    pub fn new(container: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            object: Some(object.into()),
        }
    }

    pub fn container(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            object: None,
        }
    }

    /// Build a locator from a `container/object` path
    pub fn from_path(path: &str) -> Self {
        let (container, object) = split_path(path);
        Self {
            container: container.to_string(),
            object: object.map(str::to_string),
        }
    }

    /// Full `container/object` path (just the container for whole-container locators)
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.object {
            Some(object) => write!(f, "{}/{}", self.container, object),
            None => write!(f, "{}", self.container),
        }
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
