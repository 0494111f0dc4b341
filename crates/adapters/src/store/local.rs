// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object store backed by a local directory tree
//!
//! Each container is a directory under the root; object names are the
//! `/`-joined paths of the files inside it.

use super::{page_from_sorted, ListPage, ObjectEntry, ObjectStore, ObjectStoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};

/// Directory-backed object store
#[derive(Clone)]
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, ObjectStoreError> {
        let dir = self.root.join(container);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(ObjectStoreError::ContainerNotFound(container.to_string()))
        }
    }
}

#[async_trait]
impl ObjectStore for LocalFsStore {
    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
        continuation: Option<&str>,
        max_results: usize,
    ) -> Result<ListPage, ObjectStoreError> {
        let dir = self.container_dir(container)?;
        let prefix = prefix.map(str::to_string);
        let continuation = continuation.map(str::to_string);

        tokio::task::spawn_blocking(move || -> Result<ListPage, ObjectStoreError> {
            let mut entries = Vec::new();
            collect_files(&dir, &dir, &mut entries)?;
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(page_from_sorted(
                entries,
                prefix.as_deref(),
                continuation.as_deref(),
                max_results,
            ))
        })
        .await
        .map_err(|e| ObjectStoreError::Io(io::Error::other(e)))?
    }

    async fn last_modified(
        &self,
        container: &str,
        object: &str,
    ) -> Result<DateTime<Utc>, ObjectStoreError> {
        let path = self.container_dir(container)?.join(object);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(DateTime::<Utc>::from(meta.modified()?)),
            Ok(_) => Err(not_found(container, object)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(not_found(container, object)),
            Err(e) => Err(e.into()),
        }
    }
}

fn not_found(container: &str, object: &str) -> ObjectStoreError {
    ObjectStoreError::ObjectNotFound {
        container: container.to_string(),
        object: object.to_string(),
    }
}

/// Recursively collect regular files below `dir`, named relative to `base`
fn collect_files(base: &Path, dir: &Path, out: &mut Vec<ObjectEntry>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_files(base, &path, out)?;
        } else if file_type.is_file() {
            let Some(name) = object_name(base, &path) else {
                tracing::debug!(path = %path.display(), "skipping non-UTF-8 file name");
                continue;
            };
            let modified = entry.metadata()?.modified()?;
            out.push(ObjectEntry {
                name,
                last_modified: DateTime::<Utc>::from(modified),
            });
        }
    }
    Ok(())
}

fn object_name(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
