// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed binding-data contract derived from a pattern's parameters

use std::collections::BTreeMap;

/// Values captured from a concrete path, keyed by parameter name
pub type BindingData = BTreeMap<String, String>;

/// Kind of value a parameter carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
}

/// Ordered `(name, kind)` pairs, built once per pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingDataContract {
    entries: Vec<(String, ValueKind)>,
}

impl BindingDataContract {
    pub(crate) fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            entries: names
                .into_iter()
                .map(|name| (name.to_string(), ValueKind::String))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[(String, ValueKind)] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn kind(&self, name: &str) -> Option<ValueKind> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, kind)| *kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pair captured values, in capture order, with their parameter names
    pub(crate) fn bind(&self, values: Vec<&str>) -> BindingData {
        self.entries
            .iter()
            .zip(values)
            .map(|((name, _), value)| (name.clone(), value.to_string()))
            .collect()
    }
}
