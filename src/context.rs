//! Workspace context resolution for cellsync.
//!
//! A workspace is any directory containing a `.cellsync/` state directory.
//! This module finds it from any working directory below it and derives the
//! canonical paths (config file, locks directory, per-session lock files) so
//! every process coordinating on the workspace agrees on them.

use crate::config::Config;
use crate::error::{CellsyncError, Result};
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// State directory name within the workspace root.
pub const STATE_DIR: &str = ".cellsync";

/// Regex pattern for valid session IDs.
static SESSION_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("Invalid session ID regex")
});

/// Resolved paths for a cellsync workspace. All paths are absolute.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    /// Workspace root (the directory containing `.cellsync/`).
    pub root: PathBuf,

    /// State directory (`{root}/.cellsync/`).
    pub state_dir: PathBuf,

    /// Locks directory (`{root}/.cellsync/locks/`).
    pub locks_dir: PathBuf,
}

impl WorkspaceContext {
    /// Resolve the workspace from the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            CellsyncError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Ok(Self::resolve_from(&cwd))
    }

    /// Resolve the workspace from a specific directory.
    ///
    /// Walks up from `start` looking for a `.cellsync/` directory; when none
    /// is found, `start` itself becomes the workspace root.
    pub fn resolve_from<P: AsRef<Path>>(start: P) -> Self {
        let start = start.as_ref();
        let root = start
            .ancestors()
            .find(|dir| dir.join(STATE_DIR).is_dir())
            .unwrap_or(start);
        Self::at(root)
    }

    /// Use `root` as the workspace root without searching.
    pub fn at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let state_dir = root.join(STATE_DIR);
        let locks_dir = state_dir.join("locks");
        Self {
            root,
            state_dir,
            locks_dir,
        }
    }

    /// Path to `config.yaml`.
    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join("config.yaml")
    }

    /// Load the workspace config, or defaults when no config file exists.
    pub fn load_config(&self) -> Result<Config> {
        Config::load_or_default(self.config_path())
    }

    /// Deterministic lock path for a session.
    ///
    /// # Errors
    ///
    /// * `UserError` - the session ID could escape the locks directory
    pub fn session_lock_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.locks_dir.join(format!("{}.lock", session_id)))
    }
}

/// Check that a session ID is safe to use as a file name.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    if SESSION_ID_REGEX.is_match(session_id) {
        Ok(())
    } else {
        Err(CellsyncError::UserError(format!(
            "invalid session ID '{}'. Use letters, digits, '.', '_' or '-', starting with a letter or digit",
            session_id
        )))
    }
}
