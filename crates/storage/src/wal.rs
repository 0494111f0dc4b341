// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable cursor storage
//!
//! Every save or reset appends one checksummed JSON line and syncs before
//! returning. Opening replays the log; replay stops at the first entry that
//! does not parse or verify (a torn final write). The log is rewritten with
//! one entry per live container once superseded entries dominate it.

use crate::{decode, CursorStore, StoreError};
use bw_core::ScanCursor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Superseded entries tolerated before compaction, beyond one per container
const COMPACTION_SLACK: u64 = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WalEntry {
    seq: u64,
    container: String,
    /// `None` records a reset
    cursor: Option<serde_json::Value>,
    checksum: u32,
}

impl WalEntry {
    fn new(seq: u64, container: &str, cursor: Option<serde_json::Value>) -> Self {
        let checksum = Self::checksum(container, cursor.as_ref());
        Self {
            seq,
            container: container.to_string(),
            cursor,
            checksum,
        }
    }

    fn checksum(container: &str, cursor: Option<&serde_json::Value>) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(container.as_bytes());
        hasher.update(&[0]);
        if let Some(cursor) = cursor {
            hasher.update(cursor.to_string().as_bytes());
        }
        hasher.finalize()
    }

    fn verify(&self) -> bool {
        self.checksum == Self::checksum(&self.container, self.cursor.as_ref())
    }
}

struct WalInner {
    path: PathBuf,
    file: File,
    sequence: u64,
    /// Entries currently in the file
    entries: u64,
    cursors: BTreeMap<String, serde_json::Value>,
}

/// Cursor store backed by a write-ahead log file
#[derive(Clone)]
pub struct WalCursorStore {
    inner: Arc<Mutex<WalInner>>,
}

impl WalCursorStore {
    /// Open or create the log at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let replay = replay(path)?;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut inner = WalInner {
            path: path.to_path_buf(),
            file,
            sequence: replay.last_sequence,
            entries: replay.entries,
            cursors: replay.cursors,
        };

        if replay.torn {
            tracing::warn!(path = %path.display(), "discarding torn entry at end of cursor log");
            inner.compact()?;
        } else if inner.needs_compaction() {
            inner.compact()?;
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WalInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current sequence number
    pub fn sequence(&self) -> u64 {
        self.lock().sequence
    }

    /// Number of entries in the log file
    pub fn entry_count(&self) -> u64 {
        self.lock().entries
    }
}

impl CursorStore for WalCursorStore {
    fn load(&self, container: &str) -> Result<Option<ScanCursor>, StoreError> {
        let inner = self.lock();
        inner
            .cursors
            .get(container)
            .map(|value| decode(container, value))
            .transpose()
    }

    fn save(&self, container: &str, cursor: &ScanCursor) -> Result<(), StoreError> {
        let value = serde_json::to_value(cursor)?;
        self.lock().append(container, Some(value))
    }

    fn reset(&self, container: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.cursors.contains_key(container) {
            return Ok(());
        }
        inner.append(container, None)
    }
}

impl WalInner {
    fn append(
        &mut self,
        container: &str,
        cursor: Option<serde_json::Value>,
    ) -> Result<(), StoreError> {
        let entry = WalEntry::new(self.sequence + 1, container, cursor);
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;

        self.sequence = entry.seq;
        self.entries += 1;
        match entry.cursor {
            Some(value) => {
                self.cursors.insert(entry.container, value);
            }
            None => {
                self.cursors.remove(&entry.container);
            }
        }

        if self.needs_compaction() {
            self.compact()?;
        }
        Ok(())
    }

    fn needs_compaction(&self) -> bool {
        self.entries > self.cursors.len() as u64 + COMPACTION_SLACK
    }

    /// Rewrite the log with one entry per live container
    fn compact(&mut self) -> Result<(), StoreError> {
        let temp_path = self.path.with_extension("compact.tmp");
        {
            let mut file = File::create(&temp_path)?;
            for (container, value) in &self.cursors {
                self.sequence += 1;
                let entry = WalEntry::new(self.sequence, container, Some(value.clone()));
                writeln!(file, "{}", serde_json::to_string(&entry)?)?;
            }
            file.sync_all()?;
        }

        // Atomic replace (rename is atomic on POSIX)
        std::fs::rename(&temp_path, &self.path)?;
        self.file = OpenOptions::new().append(true).open(&self.path)?;

        let before = self.entries;
        self.entries = self.cursors.len() as u64;
        tracing::debug!(
            path = %self.path.display(),
            removed = before.saturating_sub(self.entries),
            kept = self.entries,
            "compacted cursor log"
        );
        Ok(())
    }
}

struct Replay {
    cursors: BTreeMap<String, serde_json::Value>,
    last_sequence: u64,
    entries: u64,
    torn: bool,
}

fn replay(path: &Path) -> Result<Replay, StoreError> {
    let mut replay = Replay {
        cursors: BTreeMap::new(),
        last_sequence: 0,
        entries: 0,
        torn: false,
    };

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(replay),
        Err(e) => return Err(e.into()),
    };

    // Raw bytes: a tail torn inside a multi-byte character is not UTF-8
    for line in BufReader::new(file).split(b'\n') {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let entry = match serde_json::from_slice::<WalEntry>(&line) {
            Ok(entry) if entry.verify() => entry,
            _ => {
                // Stop at parse error or checksum mismatch (torn write)
                replay.torn = true;
                break;
            }
        };

        replay.last_sequence = entry.seq;
        replay.entries += 1;
        match entry.cursor {
            Some(value) => {
                replay.cursors.insert(entry.container, value);
            }
            None => {
                replay.cursors.remove(&entry.container);
            }
        }
    }

    Ok(replay)
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
