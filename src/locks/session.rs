//! Session lock handle: exclusive ownership of one lock path.
//!
//! A record is published with exclusive-create semantics. The record is first
//! written and synced to a sibling temporary file and then hard-linked onto
//! the lock path, so a lock file is never observed half-written. Filesystems
//! without hard links fall back to `create_new` followed by a write.

use super::process;
use super::record::{LockRecord, local_hostname};
use super::staleness::{self, StaleVerdict};
use crate::config::Config;
use crate::error::{CellsyncError, Result};
use crate::fs::atomic::{generate_temp_path, write_and_sync};
use chrono::Duration as ChronoDuration;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// Age below which an unparseable lock file is assumed to be mid-write.
const CORRUPT_GRACE: Duration = Duration::from_secs(2);

/// Tuning for staleness and polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOptions {
    /// Age after which a record from another host may be broken.
    pub stale_after: ChronoDuration,
    /// First sleep between contended attempts.
    pub poll_interval: Duration,
    /// Upper bound for the doubling backoff.
    pub max_poll_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for LockOptions {
    fn from(config: &Config) -> Self {
        Self {
            stale_after: ChronoDuration::minutes(i64::from(config.lock_stale_minutes)),
            poll_interval: Duration::from_millis(config.lock_poll_interval_ms),
            max_poll_interval: Duration::from_millis(config.lock_max_poll_interval_ms),
        }
    }
}

/// Result of a single non-blocking acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryAcquire {
    Acquired,
    Busy {
        /// Human-readable reason, e.g. "held by PID 4242 on build-01".
        reason: String,
        holder: Option<LockRecord>,
    },
}

impl TryAcquire {
    pub fn is_acquired(&self) -> bool {
        matches!(self, TryAcquire::Acquired)
    }
}

/// What a single exclusive-create round observed.
enum Round {
    Acquired(LockRecord),
    /// A stale or corrupt record was removed; retry without sleeping.
    Reclaimed,
    Contended {
        holder: Option<LockRecord>,
        verdict: Option<StaleVerdict>,
    },
}

/// In-memory handle for a lock path.
///
/// While held, the handle owns the on-disk record: [`SessionLock::release`]
/// or dropping the handle removes it.
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
    options: LockOptions,
    held: Option<LockRecord>,
}

impl SessionLock {
    /// Create an unheld handle for `path` with default options.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_options(path, LockOptions::default())
    }

    pub fn with_options<P: Into<PathBuf>>(path: P, options: LockOptions) -> Self {
        Self {
            path: path.into(),
            options,
            held: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// Block until the lock is acquired or `timeout` elapses.
    ///
    /// Stale records are broken and retried immediately; live holders are
    /// waited out with a doubling backoff bounded by the deadline.
    ///
    /// # Errors
    ///
    /// * `AlreadyHeld` - this handle already holds the lock
    /// * `LockTimeout` - the deadline passed; nothing is held
    /// * `Io` - the lock directory or record could not be written
    pub fn acquire(&mut self, timeout: Duration) -> Result<()> {
        if self.held.is_some() {
            return Err(CellsyncError::AlreadyHeld {
                path: self.path.clone(),
            });
        }

        let start = Instant::now();
        // A timeout too large to represent never expires
        let deadline = start.checked_add(timeout);
        let mut backoff = self.options.poll_interval;
        let mut last_holder = None;

        loop {
            match self.round()? {
                Round::Acquired(record) => {
                    info!(
                        path = %self.path.display(),
                        lock_id = %record.lock_id,
                        waited_ms = start.elapsed().as_millis() as u64,
                        "lock acquired"
                    );
                    self.held = Some(record);
                    return Ok(());
                }
                Round::Reclaimed if deadline.is_none_or(|d| Instant::now() < d) => continue,
                Round::Reclaimed => {}
                Round::Contended { holder, verdict } => {
                    debug!(
                        path = %self.path.display(),
                        holder_pid = ?holder.as_ref().map(|h| h.pid),
                        verdict = ?verdict,
                        "lock contended"
                    );
                    if holder.is_some() {
                        last_holder = holder;
                    }
                }
            }

            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(CellsyncError::LockTimeout {
                        path: self.path.clone(),
                        holder: last_holder.as_ref().map(LockRecord::holder),
                        waited: start.elapsed(),
                    });
                }
                Some(deadline) => backoff.min(deadline - now),
                None => backoff,
            };
            thread::sleep(pause);
            backoff = (backoff * 2).min(self.options.max_poll_interval);
        }
    }

    /// Make one non-blocking attempt, reporting why it failed instead of raising.
    ///
    /// A stale record found on the way is reclaimed and the attempt retried once.
    pub fn try_acquire(&mut self) -> Result<TryAcquire> {
        if self.held.is_some() {
            return Ok(TryAcquire::Busy {
                reason: "already held by this handle".to_string(),
                holder: self.held.clone(),
            });
        }

        let mut reclaimed = false;
        loop {
            match self.round()? {
                Round::Acquired(record) => {
                    info!(path = %self.path.display(), lock_id = %record.lock_id, "lock acquired");
                    self.held = Some(record);
                    return Ok(TryAcquire::Acquired);
                }
                Round::Reclaimed if !reclaimed => reclaimed = true,
                Round::Reclaimed => {
                    return Ok(TryAcquire::Busy {
                        reason: "lock changed hands during reclaim".to_string(),
                        holder: None,
                    });
                }
                Round::Contended { holder, verdict } => {
                    let reason = match (&holder, &verdict) {
                        (Some(h), Some(StaleVerdict::Unverifiable { reason })) => format!(
                            "held by PID {} on {} (state unknown: {})",
                            h.pid, h.hostname, reason
                        ),
                        (Some(h), _) => format!("held by PID {} on {}", h.pid, h.hostname),
                        (None, _) => "lock file is being written by another process".to_string(),
                    };
                    return Ok(TryAcquire::Busy { reason, holder });
                }
            }
        }
    }

    /// Remove the record this handle owns. A no-op when not held.
    ///
    /// A record that no longer carries this handle's `lockId` (it was broken
    /// and re-acquired elsewhere) is left in place.
    pub fn release(&mut self) -> Result<()> {
        let Some(record) = self.held.take() else {
            return Ok(());
        };

        match LockRecord::read_permissive(&self.path) {
            Some(on_disk) if on_disk.lock_id != record.lock_id => {
                warn!(
                    path = %self.path.display(),
                    ours = %record.lock_id,
                    theirs = %on_disk.lock_id,
                    "lock was taken over by another holder; leaving it in place"
                );
                return Ok(());
            }
            _ => {}
        }

        remove_if_present(&self.path).map_err(|e| {
            CellsyncError::Io(format!(
                "failed to release lock '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        info!(path = %self.path.display(), lock_id = %record.lock_id, "lock released");
        Ok(())
    }

    /// Unconditionally remove the record at this handle's path.
    ///
    /// Returns the record that was removed, if one was readable.
    pub fn force_break(&mut self) -> Result<Option<LockRecord>> {
        let existing = LockRecord::read_permissive(&self.path);
        remove_if_present(&self.path).map_err(|e| {
            CellsyncError::Io(format!(
                "failed to break lock '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        self.held = None;
        warn!(
            path = %self.path.display(),
            holder_pid = ?existing.as_ref().map(|r| r.pid),
            holder_host = ?existing.as_ref().map(|r| r.hostname.as_str()),
            "lock forcibly broken"
        );
        Ok(existing)
    }

    /// The record this handle believes it holds. Does not touch the filesystem.
    pub fn lock_info(&self) -> Option<&LockRecord> {
        self.held.as_ref()
    }

    /// Whether this handle believes it holds the lock. Does not touch the filesystem.
    pub fn is_locked(&self) -> bool {
        self.held.is_some()
    }

    /// One exclusive-create attempt, reclaiming a stale record if found.
    fn round(&self) -> Result<Round> {
        let record = LockRecord::for_current_process();
        if publish_exclusive(&self.path, &record)? {
            return Ok(Round::Acquired(record));
        }

        let Some(existing) = LockRecord::read_permissive(&self.path) else {
            return self.reclaim_unreadable();
        };

        let verdict = staleness::evaluate(&existing, &local_hostname(), self.options.stale_after);
        if verdict.can_break() {
            if break_if_unchanged(&self.path, &existing)? {
                warn!(
                    path = %self.path.display(),
                    holder_pid = existing.pid,
                    holder_host = %existing.hostname,
                    reason = %verdict,
                    "reclaimed stale lock"
                );
            }
            return Ok(Round::Reclaimed);
        }

        Ok(Round::Contended {
            holder: Some(existing),
            verdict: Some(verdict),
        })
    }

    /// Handle a lock file that exists but does not parse.
    fn reclaim_unreadable(&self) -> Result<Round> {
        let stamp = match FileStamp::read(&self.path) {
            Ok(stamp) => stamp,
            // Vanished between the create attempt and the read
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Round::Reclaimed),
            Err(e) => {
                return Err(CellsyncError::Io(format!(
                    "failed to inspect lock '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let age = SystemTime::now()
            .duration_since(stamp.modified)
            .unwrap_or(Duration::ZERO);
        if age < CORRUPT_GRACE {
            return Ok(Round::Contended {
                holder: None,
                verdict: None,
            });
        }

        if remove_if_still_unreadable(&self.path, &stamp)? {
            warn!(path = %self.path.display(), "removed unreadable lock record");
        }
        Ok(Round::Reclaimed)
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if self.held.is_some()
            && let Err(e) = self.release()
        {
            warn!(path = %self.path.display(), error = %e, "failed to release lock on drop");
        }
    }
}

/// Publish `record` at `path` only if no record exists there.
///
/// Returns `Ok(false)` when another record is already present.
fn publish_exclusive(path: &Path, record: &LockRecord) -> Result<bool> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            CellsyncError::Io(format!(
                "failed to create locks directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let json = record.to_json()?;
    let temp_path = generate_temp_path(path)?;
    if let Err(e) = write_and_sync(&temp_path, json.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    let linked = fs::hard_link(&temp_path, path);
    let _ = fs::remove_file(&temp_path);

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => {
            debug!(error = %e, "hard link unavailable; falling back to create_new");
            create_new_with(path, json.as_bytes())
        }
    }
}

fn create_new_with(path: &Path, content: &[u8]) -> Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(CellsyncError::Io(format!(
                "failed to create lock '{}': {}",
                path.display(),
                e
            )));
        }
    };

    if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
        let _ = fs::remove_file(path);
        return Err(CellsyncError::Io(format!(
            "failed to write lock record '{}': {}",
            path.display(),
            e
        )));
    }
    Ok(true)
}

/// Remove the record at `path` if it is still the `expected` one.
fn break_if_unchanged(path: &Path, expected: &LockRecord) -> Result<bool> {
    match LockRecord::read_permissive(path) {
        Some(current) if current.lock_id == expected.lock_id => {
            remove_if_present(path).map_err(|e| {
                CellsyncError::Io(format!(
                    "failed to remove stale lock '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Modification time and size of a lock file when it was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    pub(super) fn read(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            modified: metadata.modified()?,
            len: metadata.len(),
        })
    }
}

/// Remove the unreadable file at `path` only if it is the one `judged`.
///
/// A file that now parses, or whose stamp moved, belongs to a newer writer
/// and is left in place.
pub(super) fn remove_if_still_unreadable(path: &Path, judged: &FileStamp) -> Result<bool> {
    if LockRecord::read_permissive(path).is_some() {
        return Ok(false);
    }
    match FileStamp::read(path) {
        Ok(current) if current == *judged => {}
        Ok(_) => return Ok(false),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(CellsyncError::Io(format!(
                "failed to inspect lock '{}': {}",
                path.display(),
                e
            )));
        }
    }

    remove_if_present(path).map_err(|e| {
        CellsyncError::Io(format!(
            "failed to remove corrupt lock '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(true)
}

pub(super) fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Whether `record` describes the current process.
pub(super) fn is_current_process(record: &LockRecord) -> bool {
    let pid = std::process::id();
    record.pid == pid
        && record.hostname == local_hostname()
        && match (record.process_start_time, process::start_time_of(pid)) {
            (Some(recorded), Some(actual)) => recorded == actual,
            _ => true,
        }
}
