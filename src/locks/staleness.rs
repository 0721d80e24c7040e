//! Stale-lock evaluation.
//!
//! A record is breakable when its holder is provably gone:
//! - same host: the PID is not running, or is running with a different
//!   start-time fingerprint (the PID was recycled)
//! - other host: liveness cannot be checked, so only records older than the
//!   configured threshold are breakable
//!
//! A same-host holder whose state cannot be determined is never broken.

use super::process::{self, Liveness};
use super::record::LockRecord;
use crate::error::Result;
use chrono::Duration;
use std::fmt;

/// Outcome of a staleness check on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleVerdict {
    /// Holder is alive (or too recent to judge); not breakable.
    Fresh,
    /// Same-host holder process no longer exists.
    HolderDead,
    /// Same-host PID is alive but belongs to a different process.
    PidReused { recorded: u64, actual: u64 },
    /// Cross-host record older than the threshold.
    Expired { age_minutes: i64 },
    /// Same-host liveness could not be determined; not breakable.
    Unverifiable { reason: String },
}

impl StaleVerdict {
    pub fn can_break(&self) -> bool {
        matches!(
            self,
            StaleVerdict::HolderDead | StaleVerdict::PidReused { .. } | StaleVerdict::Expired { .. }
        )
    }
}

impl fmt::Display for StaleVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleVerdict::Fresh => write!(f, "holder is active"),
            StaleVerdict::HolderDead => write!(f, "holder process has exited"),
            StaleVerdict::PidReused { recorded, actual } => write!(
                f,
                "PID was reused (recorded start {}, current start {})",
                recorded, actual
            ),
            StaleVerdict::Expired { age_minutes } => {
                write!(f, "remote lock expired ({} min old)", age_minutes)
            }
            StaleVerdict::Unverifiable { reason } => {
                write!(f, "holder state unknown: {}", reason)
            }
        }
    }
}

/// Evaluate `record` against the local host and live process table.
pub fn evaluate(record: &LockRecord, local_host: &str, stale_after: Duration) -> StaleVerdict {
    evaluate_with(record, local_host, stale_after, process::probe)
}

/// Evaluate `record` using `probe` for same-host liveness.
pub fn evaluate_with<F>(
    record: &LockRecord,
    local_host: &str,
    stale_after: Duration,
    probe: F,
) -> StaleVerdict
where
    F: FnOnce(u32) -> Result<Liveness>,
{
    if !record.is_from_host(local_host) {
        let age = record.age();
        return if age > stale_after {
            StaleVerdict::Expired {
                age_minutes: age.num_minutes(),
            }
        } else {
            StaleVerdict::Fresh
        };
    }

    match probe(record.pid) {
        Ok(Liveness::Dead) => StaleVerdict::HolderDead,
        Ok(Liveness::Alive { start_time }) => match (record.process_start_time, start_time) {
            (Some(recorded), Some(actual)) if recorded != actual => {
                StaleVerdict::PidReused { recorded, actual }
            }
            _ => StaleVerdict::Fresh,
        },
        Err(e) => StaleVerdict::Unverifiable {
            reason: e.to_string(),
        },
    }
}
