//! Lock record persisted form and utilities.

use crate::error::{CellsyncError, HolderSummary, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Lock record stored in lock files.
///
/// The existence of a record at a lock path means the resource is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Token unique to one acquisition.
    pub lock_id: String,

    /// Process ID of the lock holder.
    pub pid: u32,

    /// Host the holder runs on.
    pub hostname: String,

    /// Timestamp when the lock was acquired (RFC3339).
    pub acquired_at: DateTime<Utc>,

    /// Boot-relative creation time of the holder process, used to detect PID reuse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_start_time: Option<u64>,
}

impl LockRecord {
    /// Create a record describing the current process, stamped now.
    pub fn for_current_process() -> Self {
        let pid = std::process::id();
        Self {
            lock_id: uuid::Uuid::new_v4().to_string(),
            pid,
            hostname: local_hostname(),
            acquired_at: Utc::now(),
            process_start_time: super::process::start_time_of(pid),
        }
    }

    /// Parse a lock record from a file.
    ///
    /// Fails with `CorruptRecord` when the file is unreadable or a required
    /// field is missing.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CellsyncError::CorruptRecord {
            path: path.to_path_buf(),
            reason: format!("failed to read lock file: {}", e),
        })?;

        serde_json::from_str(&content).map_err(|e| CellsyncError::CorruptRecord {
            path: path.to_path_buf(),
            reason: format!("failed to parse lock file: {}", e),
        })
    }

    /// Read the record at `path`, treating a missing or corrupt file as "no lock".
    pub fn read_permissive<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(record) => Some(record),
            Err(e) => {
                if path.exists() {
                    tracing::debug!(error = %e, "ignoring unreadable lock record");
                }
                None
            }
        }
    }

    /// Serialize the record to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CellsyncError::Io(format!("failed to serialize lock record: {}", e)))
    }

    /// Time elapsed since acquisition. Negative under clock skew.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.acquired_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let seconds = age.num_seconds();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else {
            format!("{}s", seconds.max(0))
        }
    }

    /// Whether this record was written on `host`.
    pub fn is_from_host(&self, host: &str) -> bool {
        self.hostname == host
    }

    pub fn holder(&self) -> HolderSummary {
        HolderSummary {
            pid: self.pid,
            hostname: self.hostname.clone(),
        }
    }
}

/// Hostname of the machine this process runs on.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
