//! Local process inspection: liveness plus a start-time fingerprint.
//!
//! On Linux the fingerprint is field 22 (`starttime`, clock ticks since boot)
//! of `/proc/<pid>/stat`. It stays constant for the life of a process and
//! differs for any later process that recycles the same PID.

use crate::error::{CellsyncError, Result};

/// Observed state of a local process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// The process exists. `start_time` is `None` where the platform offers
    /// no fingerprint.
    Alive { start_time: Option<u64> },
    /// No such process (or a zombie).
    Dead,
}

/// Inspect process `pid`.
///
/// Fails with `ProcessUnreachable` when the state cannot be determined.
pub fn probe(pid: u32) -> Result<Liveness> {
    if pid == 0 {
        return Ok(Liveness::Dead);
    }
    probe_platform(pid)
}

/// Start-time fingerprint of `pid`, if it is alive and the platform has one.
pub fn start_time_of(pid: u32) -> Option<u64> {
    match probe(pid) {
        Ok(Liveness::Alive { start_time }) => start_time,
        _ => None,
    }
}

#[cfg(target_os = "linux")]
fn probe_platform(pid: u32) -> Result<Liveness> {
    let stat_path = format!("/proc/{}/stat", pid);
    match std::fs::read_to_string(&stat_path) {
        Ok(stat) => parse_stat(&stat).ok_or_else(|| CellsyncError::ProcessUnreachable {
            pid,
            reason: format!("unrecognized format in {}", stat_path),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Liveness::Dead),
        Err(e) => Err(CellsyncError::ProcessUnreachable {
            pid,
            reason: format!("failed to read {}: {}", stat_path, e),
        }),
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn probe_platform(pid: u32) -> Result<Liveness> {
    let output = std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .output()
        .map_err(|e| CellsyncError::ProcessUnreachable {
            pid,
            reason: format!("failed to run kill -0: {}", e),
        })?;

    if output.status.success() {
        return Ok(Liveness::Alive { start_time: None });
    }
    // EPERM means the process exists but belongs to someone else
    let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
    if stderr.contains("not permitted") {
        Ok(Liveness::Alive { start_time: None })
    } else {
        Ok(Liveness::Dead)
    }
}

#[cfg(not(unix))]
fn probe_platform(pid: u32) -> Result<Liveness> {
    Err(CellsyncError::ProcessUnreachable {
        pid,
        reason: "process inspection is not supported on this platform".to_string(),
    })
}

/// Parse the contents of `/proc/<pid>/stat`.
///
/// The command name (field 2) is parenthesized and may itself contain spaces
/// or parentheses, so fields are counted from the last `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_stat(stat: &str) -> Option<Liveness> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // fields[0] is field 3 (state); starttime is field 22
    let state = *fields.first()?;
    if state == "Z" || state == "X" {
        return Some(Liveness::Dead);
    }
    let start_time = fields.get(19)?.parse::<u64>().ok()?;
    Some(Liveness::Alive {
        start_time: Some(start_time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1234 (my (odd) cmd) S 1 1234 1234 0 -1 4194560 1000 0 0 0 \
                          10 5 0 0 20 0 1 0 987654 10000000 500 18446744073709551615";

    #[test]
    fn parse_stat_reads_start_time() {
        assert_eq!(
            parse_stat(SAMPLE),
            Some(Liveness::Alive {
                start_time: Some(987654)
            })
        );
    }

    #[test]
    fn parse_stat_treats_zombie_as_dead() {
        let zombie = SAMPLE.replace(") S ", ") Z ");
        assert_eq!(parse_stat(&zombie), Some(Liveness::Dead));
    }

    #[test]
    fn parse_stat_rejects_garbage() {
        assert_eq!(parse_stat("no parens here"), None);
        assert_eq!(parse_stat("1 (x) S 1 2"), None);
    }

    #[test]
    fn pid_zero_is_dead() {
        assert_eq!(probe(0).unwrap(), Liveness::Dead);
    }

    #[cfg(unix)]
    #[test]
    fn current_process_is_alive() {
        assert!(matches!(
            probe(std::process::id()).unwrap(),
            Liveness::Alive { .. }
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_process_has_stable_start_time() {
        let a = start_time_of(std::process::id());
        let b = start_time_of(std::process::id());
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[cfg(unix)]
    #[test]
    fn exited_child_is_dead() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert_eq!(probe(pid).unwrap(), Liveness::Dead);
    }
}
