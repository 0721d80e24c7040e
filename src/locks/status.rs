//! Fresh on-disk lock inspection and listing.

use super::record::{LockRecord, local_hostname};
use super::session::{LockOptions, is_current_process};
use super::staleness::{self, StaleVerdict};
use crate::error::{CellsyncError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot of a lock path read from disk.
#[derive(Debug, Clone)]
pub struct LockStatus {
    /// The lock file path.
    pub path: PathBuf,

    /// Lock name (file stem), e.g. the session id.
    pub name: String,

    /// Whether a valid record exists. Corrupt records report `false`.
    pub locked: bool,

    /// The record, when one could be read.
    pub record: Option<LockRecord>,

    /// Staleness verdict for the record.
    pub verdict: Option<StaleVerdict>,

    /// Whether the record may be reclaimed without operator intervention.
    pub can_break: bool,

    /// Whether the record was written by this very process.
    pub owned_by_current_process: bool,
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            None => write!(f, "{} (unlocked)", self.name),
            Some(record) => write!(
                f,
                "{} (PID {} on {}, age: {}{})",
                self.name,
                record.pid,
                record.hostname,
                record.age_string(),
                if self.can_break { ", STALE" } else { "" }
            ),
        }
    }
}

/// Read the lock at `path` using default staleness settings.
pub fn get_lock_status<P: AsRef<Path>>(path: P) -> LockStatus {
    get_lock_status_with(path, &LockOptions::default())
}

/// Read the lock at `path` and judge it with `options`.
pub fn get_lock_status_with<P: AsRef<Path>>(path: P, options: &LockOptions) -> LockStatus {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();

    let Some(record) = LockRecord::read_permissive(path) else {
        return LockStatus {
            path: path.to_path_buf(),
            name,
            locked: false,
            record: None,
            verdict: None,
            can_break: false,
            owned_by_current_process: false,
        };
    };

    let verdict = staleness::evaluate(&record, &local_hostname(), options.stale_after);
    LockStatus {
        path: path.to_path_buf(),
        name,
        locked: true,
        can_break: verdict.can_break(),
        owned_by_current_process: is_current_process(&record),
        verdict: Some(verdict),
        record: Some(record),
    }
}

/// List every `*.lock` file in `dir`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn list_locks<P: AsRef<Path>>(dir: P, options: &LockOptions) -> Result<Vec<LockStatus>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|e| {
        CellsyncError::Io(format!(
            "failed to read locks directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut locks = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            CellsyncError::Io(format!("failed to read locks directory entry: {}", e))
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("lock") {
            continue;
        }
        locks.push(get_lock_status_with(&path, options));
    }

    locks.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(locks)
}
