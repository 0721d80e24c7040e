//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for a cellsync workspace.
///
/// This struct represents the contents of `.cellsync/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Minutes after which a lock held from another host may be broken.
    ///
    /// Same-host locks are judged by holder liveness instead.
    #[serde(default = "default_lock_stale_minutes")]
    pub lock_stale_minutes: u32,

    /// First sleep between contended acquisition attempts, in milliseconds.
    #[serde(default = "default_lock_poll_interval_ms")]
    pub lock_poll_interval_ms: u64,

    /// Upper bound of the polling backoff, in milliseconds.
    #[serde(default = "default_lock_max_poll_interval_ms")]
    pub lock_max_poll_interval_ms: u64,

    /// Default timeout for blocking acquisition from the CLI, in seconds.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    // =========================================================================
    // Identity settings
    // =========================================================================
    /// Prefix of generated cell identifiers (`<prefix>-<8 hex>`).
    #[serde(default = "default_cell_id_prefix")]
    pub cell_id_prefix: String,

    /// Format minor version recorded once every cell carries an identifier.
    #[serde(default = "default_target_format_minor")]
    pub target_format_minor: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_stale_minutes: default_lock_stale_minutes(),
            lock_poll_interval_ms: default_lock_poll_interval_ms(),
            lock_max_poll_interval_ms: default_lock_max_poll_interval_ms(),
            lock_timeout_secs: default_lock_timeout_secs(),
            cell_id_prefix: default_cell_id_prefix(),
            target_format_minor: default_target_format_minor(),
        }
    }
}
