// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern format and render errors

use crate::locator::NameError;
use thiserror::Error;

/// A malformed pattern string, reported at registration time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern '{pattern}' is not well formed: missing '}}' for '{{' at {position}")]
    Unterminated { pattern: String, position: usize },

    #[error("pattern '{pattern}' has an unmatched '}}' at {position}")]
    UnmatchedClose { pattern: String, position: usize },

    #[error("pattern '{pattern}' has an empty parameter at {position}")]
    EmptyName { pattern: String, position: usize },

    #[error("invalid parameter name '{name}' in pattern '{pattern}'")]
    InvalidName { pattern: String, name: String },

    #[error("duplicate parameter name '{name}' in pattern '{pattern}'")]
    DuplicateName { pattern: String, name: String },

    #[error("invalid container in pattern '{pattern}': {source}")]
    InvalidContainerName {
        pattern: String,
        #[source]
        source: NameError,
    },

    #[error("invalid object name in pattern '{pattern}': {source}")]
    InvalidObjectName {
        pattern: String,
        #[source]
        source: NameError,
    },

    #[error("pattern '{pattern}' does not address container '{container}'")]
    ContainerMismatch { pattern: String, container: String },
}

/// Failure to build a concrete path from a pattern
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no value for parameter '{name}' in pattern '{pattern}'")]
    MissingParameter { pattern: String, name: String },

    #[error("rendered container is invalid for pattern '{pattern}': {source}")]
    InvalidContainerName {
        pattern: String,
        #[source]
        source: NameError,
    },
}
