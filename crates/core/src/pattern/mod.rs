// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path patterns: `container/{name}.csv` style templates over object paths
//!
//! A pattern is split at its first `/` into a container segment and an
//! optional object segment. Each segment compiles to its own
//! [`CaptureMatcher`], so a capture never crosses the container boundary.
//! A pattern without `/` matches every object in the container.

mod contract;
mod error;
mod matcher;
mod resolver;

pub use contract::{BindingData, BindingDataContract, ValueKind};
pub use error::{PatternError, RenderError};
pub use matcher::CaptureMatcher;
pub use resolver::{ParameterResolvers, DATETIME, DATETIME_FORMAT, RAND_GUID};

use crate::locator::{split_path, validate_container_name, validate_object_name};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// One piece of a parsed pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(String),
    Parameter(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(text) => f.write_str(text),
            Token::Parameter(name) => write!(f, "{{{}}}", name),
        }
    }
}

/// A parsed, immutable path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    tokens: Vec<Token>,
    container_tokens: Vec<Token>,
    object_tokens: Option<Vec<Token>>,
    container_matcher: CaptureMatcher,
    object_matcher: Option<CaptureMatcher>,
    contract: BindingDataContract,
    resolvers: Arc<ParameterResolvers>,
}

impl PathPattern {
    /// Parse a pattern with no system parameters
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        Self::parse_with(pattern, Arc::new(ParameterResolvers::empty()))
    }

    /// Parse a pattern, accepting the registry's system parameter names
    pub fn parse_with(
        pattern: &str,
        resolvers: Arc<ParameterResolvers>,
    ) -> Result<Self, PatternError> {
        let tokens = tokenize(pattern, &resolvers)?;
        let (container_tokens, object_tokens) = split_tokens(&tokens);

        if let Some(container) = fixed_text(&container_tokens) {
            validate_container_name(&container).map_err(|source| {
                PatternError::InvalidContainerName {
                    pattern: pattern.to_string(),
                    source,
                }
            })?;
        }
        if let Some(object) = object_tokens.as_deref().and_then(fixed_text) {
            validate_object_name(&object).map_err(|source| PatternError::InvalidObjectName {
                pattern: pattern.to_string(),
                source,
            })?;
        }

        let contract = BindingDataContract::from_names(
            container_tokens
                .iter()
                .chain(object_tokens.iter().flatten())
                .filter_map(parameter_name),
        );

        Ok(Self {
            raw: pattern.to_string(),
            container_matcher: CaptureMatcher::compile(&container_tokens),
            object_matcher: object_tokens.as_deref().map(CaptureMatcher::compile),
            tokens,
            container_tokens,
            object_tokens,
            contract,
            resolvers,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Parameter names in pattern order
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(parameter_name)
    }

    pub fn contract(&self) -> &BindingDataContract {
        &self.contract
    }

    /// True when the pattern has no parameters
    pub fn is_fixed(&self) -> bool {
        self.contract.is_empty()
    }

    /// True when the pattern names only a container
    pub fn is_container_only(&self) -> bool {
        self.object_tokens.is_none()
    }

    /// The container name, when the container segment has no parameters
    pub fn container_name(&self) -> Option<String> {
        fixed_text(&self.container_tokens)
    }

    /// Literal text every matching object name starts with
    pub fn object_prefix(&self) -> &str {
        match self.object_tokens.as_deref() {
            Some([Token::Literal(text), ..]) => text.as_str(),
            _ => "",
        }
    }

    /// Match a concrete `container/object` path, returning captured values
    ///
    /// Returns `None` when the path is irrelevant to this pattern; matching
    /// never fails with an error.
    pub fn matches(&self, path: &str) -> Option<BindingData> {
        let (container, object) = split_path(path);
        let mut values = self.container_matcher.captures(container)?;
        match (&self.object_matcher, object) {
            (None, _) => {}
            (Some(matcher), Some(object)) => values.extend(matcher.captures(object)?),
            (Some(_), None) => return None,
        }
        Some(self.contract.bind(values))
    }

    /// Build a concrete path from parameter values
    ///
    /// System parameters without a supplied value are filled from the
    /// resolver registry the pattern was parsed with.
    pub fn render(&self, values: &BindingData) -> Result<String, RenderError> {
        let container = self.render_tokens(&self.container_tokens, values)?;
        if !self.container_matcher.is_fixed() {
            validate_container_name(&container).map_err(|source| {
                RenderError::InvalidContainerName {
                    pattern: self.raw.clone(),
                    source,
                }
            })?;
        }
        match &self.object_tokens {
            Some(tokens) => {
                let object = self.render_tokens(tokens, values)?;
                Ok(format!("{}/{}", container, object))
            }
            None => Ok(container),
        }
    }

    fn render_tokens(&self, tokens: &[Token], values: &BindingData) -> Result<String, RenderError> {
        let mut out = String::new();
        for token in tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Parameter(name) => {
                    let value = values
                        .get(name)
                        .cloned()
                        .or_else(|| self.resolvers.resolve(name))
                        .ok_or_else(|| RenderError::MissingParameter {
                            pattern: self.raw.clone(),
                            name: name.clone(),
                        })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for PathPattern {}

impl Hash for PathPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tokens.hash(state);
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parameter_name(token: &Token) -> Option<&str> {
    match token {
        Token::Parameter(name) => Some(name),
        Token::Literal(_) => None,
    }
}

/// Concatenated text of a segment made only of literals
fn fixed_text(tokens: &[Token]) -> Option<String> {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Parameter(_) => return None,
        }
    }
    Some(out)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn tokenize(pattern: &str, resolvers: &ParameterResolvers) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut seen = HashSet::new();
    let mut position = 0;

    while let Some(c) = pattern[position..].chars().next() {
        match c {
            '{' => {
                let start = position + 1;
                let close = pattern[start..]
                    .find('}')
                    .map(|offset| start + offset)
                    .ok_or_else(|| PatternError::Unterminated {
                        pattern: pattern.to_string(),
                        position,
                    })?;
                let name = &pattern[start..close];
                if name.is_empty() {
                    return Err(PatternError::EmptyName {
                        pattern: pattern.to_string(),
                        position,
                    });
                }
                if !is_identifier(name) && !resolvers.contains(name) {
                    return Err(PatternError::InvalidName {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                if !seen.insert(name) {
                    return Err(PatternError::DuplicateName {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Parameter(name.to_string()));
                position = close + 1;
            }
            '}' => {
                return Err(PatternError::UnmatchedClose {
                    pattern: pattern.to_string(),
                    position,
                });
            }
            _ => {
                literal.push(c);
                position += c.len_utf8();
            }
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Split tokens at the first `/` found in a literal
fn split_tokens(tokens: &[Token]) -> (Vec<Token>, Option<Vec<Token>>) {
    let mut container = Vec::new();
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        if let Token::Literal(text) = token {
            if let Some((head, tail)) = text.split_once('/') {
                if !head.is_empty() {
                    container.push(Token::Literal(head.to_string()));
                }
                let mut object = Vec::new();
                if !tail.is_empty() {
                    object.push(Token::Literal(tail.to_string()));
                }
                object.extend(iter.cloned());
                return (container, Some(object));
            }
        }
        container.push(token.clone());
    }

    (container, None)
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
