// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration table: which executors watch which containers

use bw_adapters::TriggerExecutor;
use bw_core::{
    validate_container_name, BindingData, IdGen, ObjectLocator, ParameterResolvers, PathPattern,
    PatternError,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Identifies one registration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(pub String);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An executor attached to a container, optionally filtered by a pattern
pub struct Registration {
    pub id: RegistrationId,
    pub container: String,
    pub pattern: Option<PathPattern>,
    pub executor: Arc<dyn TriggerExecutor>,
}

impl Registration {
    /// Binding data for `locator`, or `None` when it is irrelevant here
    pub fn matches(&self, locator: &ObjectLocator) -> Option<BindingData> {
        if locator.container != self.container {
            return None;
        }
        match &self.pattern {
            Some(pattern) => pattern.matches(&locator.path()),
            None => Some(BindingData::new()),
        }
    }

    /// Literal object-name prefix every match starts with
    ///
    /// `None` when the registration accepts any object.
    pub fn object_prefix(&self) -> Option<&str> {
        self.pattern
            .as_ref()
            .filter(|pattern| !pattern.is_container_only())
            .map(PathPattern::object_prefix)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("container", &self.container)
            .field("pattern", &self.pattern.as_ref().map(PathPattern::as_str))
            .finish_non_exhaustive()
    }
}

/// Returned by [`Registry::register`]; pass back to unregister
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    pub id: RegistrationId,
    pub container: String,
}

pub type Snapshot = BTreeMap<String, Vec<Arc<Registration>>>;

/// Shared registration table
///
/// Mutated only by register/unregister; poll cycles work off a snapshot.
#[derive(Clone)]
pub struct Registry<I: IdGen> {
    table: Arc<Mutex<Snapshot>>,
    id_gen: I,
    resolvers: Arc<ParameterResolvers>,
}

impl<I: IdGen> Registry<I> {
    pub fn new(id_gen: I, resolvers: Arc<ParameterResolvers>) -> Self {
        Self {
            table: Arc::new(Mutex::new(BTreeMap::new())),
            id_gen,
            resolvers,
        }
    }

    /// Attach `executor` to `container`
    ///
    /// `pattern` of `None` means any object in the container. Bad patterns
    /// are rejected here and never stored.
    pub fn register(
        &self,
        container: &str,
        pattern: Option<&str>,
        executor: Arc<dyn TriggerExecutor>,
    ) -> Result<RegistrationHandle, PatternError> {
        validate_container_name(container).map_err(|source| {
            PatternError::InvalidContainerName {
                pattern: pattern.unwrap_or(container).to_string(),
                source,
            }
        })?;

        let pattern = pattern
            .map(|raw| PathPattern::parse_with(raw, Arc::clone(&self.resolvers)))
            .transpose()?;
        if let Some(pattern) = &pattern {
            if pattern.container_name().is_some_and(|name| name != container) {
                return Err(PatternError::ContainerMismatch {
                    pattern: pattern.as_str().to_string(),
                    container: container.to_string(),
                });
            }
        }

        let id = RegistrationId(self.id_gen.next());
        let registration = Arc::new(Registration {
            id: id.clone(),
            container: container.to_string(),
            pattern,
            executor,
        });
        self.lock()
            .entry(container.to_string())
            .or_default()
            .push(registration);

        tracing::info!(registration = %id, container, "registered");
        Ok(RegistrationHandle {
            id,
            container: container.to_string(),
        })
    }

    /// Remove a registration; returns false when it was already gone
    pub fn unregister(&self, handle: &RegistrationHandle) -> bool {
        let mut table = self.lock();
        let Some(registrations) = table.get_mut(&handle.container) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|registration| registration.id != handle.id);
        let removed = registrations.len() < before;
        if registrations.is_empty() {
            table.remove(&handle.container);
        }
        if removed {
            tracing::info!(registration = %handle.id, container = %handle.container, "unregistered");
        }
        removed
    }

    /// Copy of the table for one poll cycle
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    pub fn is_watched(&self, container: &str) -> bool {
        self.lock().contains_key(container)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Longest literal prefix shared by every registration of a container
///
/// `None` when any registration accepts arbitrary object names.
pub(crate) fn scan_prefix(registrations: &[Arc<Registration>]) -> Option<String> {
    let mut prefixes = registrations.iter().map(|r| r.object_prefix());
    let mut common = prefixes.next()??.to_string();
    for prefix in prefixes {
        let prefix = prefix?;
        let shared: usize = common
            .char_indices()
            .zip(prefix.chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((_, a), _)| a.len_utf8())
            .sum();
        common.truncate(shared);
    }
    (!common.is_empty()).then_some(common)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
