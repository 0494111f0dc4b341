// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of system parameters resolved at render time
//!
//! Built explicitly and handed to the parser, so tests can swap in
//! deterministic resolvers.

use crate::clock::Clock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub const RAND_GUID: &str = "rand-guid";
pub const DATETIME: &str = "datetime";

/// Format used by the `datetime` resolver; safe inside object names
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

type ResolveFn = dyn Fn() -> String + Send + Sync;

/// Named resolvers for system parameters such as `{rand-guid}`
#[derive(Clone, Default)]
pub struct ParameterResolvers {
    resolvers: BTreeMap<String, Arc<ResolveFn>>,
}

impl ParameterResolvers {
    /// A registry with no system parameters
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in `rand-guid` and `datetime` resolvers
    pub fn builtin<C: Clock>(clock: C) -> Self {
        Self::empty()
            .with(RAND_GUID, || uuid::Uuid::new_v4().to_string())
            .with(DATETIME, move || clock.now().format(DATETIME_FORMAT).to_string())
    }

    /// Add or replace a resolver
    pub fn with<F>(mut self, name: impl Into<String>, resolve: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.resolvers.insert(name.into(), Arc::new(resolve));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Option<String> {
        self.resolvers.get(name).map(|resolve| resolve())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ParameterResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resolvers.keys()).finish()
    }
}
