//! Error types for cellsync.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//! Lock and validation failures carry the resource path (and the current holder
//! for locks) so callers can act on them without inspecting internals.

use crate::exit_codes;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Who holds a contended lock, as read from its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderSummary {
    pub pid: u32,
    pub hostname: String,
}

impl fmt::Display for HolderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID {} on {}", self.pid, self.hostname)
    }
}

/// Main error type for cellsync operations.
///
/// Each variant maps to a specific exit code via [`CellsyncError::exit_code`].
#[derive(Error, Debug)]
pub enum CellsyncError {
    /// Deadline passed while waiting for a lock.
    #[error("timed out after {waited:?} waiting for lock '{}'{}", path.display(), holder_suffix(holder))]
    LockTimeout {
        path: PathBuf,
        holder: Option<HolderSummary>,
        waited: Duration,
    },

    /// Re-entrant acquisition on a handle that already holds its lock.
    #[error("lock '{}' is already held by this handle", path.display())]
    AlreadyHeld { path: PathBuf },

    /// Content would not satisfy the destination's structured format.
    #[error("validation failed for '{}' ({format}): {reason}", path.display())]
    ValidationFailed {
        path: PathBuf,
        format: String,
        reason: String,
    },

    /// A record on disk is unreadable or missing required fields.
    #[error("corrupt record at '{}': {reason}", path.display())]
    CorruptRecord { path: PathBuf, reason: String },

    /// The liveness of a process could not be determined.
    #[error("cannot determine state of process {pid}: {reason}")]
    ProcessUnreachable { pid: u32, reason: String },

    /// A filesystem operation failed.
    #[error("{0}")]
    Io(String),

    /// User provided invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),
}

fn holder_suffix(holder: &Option<HolderSummary>) -> String {
    match holder {
        Some(h) => format!(" (held by {})", h),
        None => String::new(),
    }
}

impl CellsyncError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CellsyncError::LockTimeout { .. }
            | CellsyncError::AlreadyHeld { .. }
            | CellsyncError::ProcessUnreachable { .. } => exit_codes::LOCK_FAILURE,
            CellsyncError::ValidationFailed { .. } => exit_codes::VALIDATION_FAILURE,
            CellsyncError::CorruptRecord { .. } => exit_codes::CORRUPT_RECORD,
            CellsyncError::Io(_) | CellsyncError::UserError(_) => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for cellsync operations.
pub type Result<T> = std::result::Result<T, CellsyncError>;
