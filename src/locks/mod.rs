//! Locking subsystem for cellsync.
//!
//! This module implements single-owner mutual exclusion over a session,
//! coordinated through the filesystem only.
//!
//! # Lock Files
//!
//! Session lock files live in `.cellsync/locks/<session>.lock`. A lock file's
//! existence means "held"; its absence means "free". Records are published
//! with exclusive-create semantics so only one process can create a given
//! lock at a time.
//!
//! # Lock Records
//!
//! Each lock file contains a JSON record:
//! - `lockId`: token unique to one acquisition
//! - `pid`: holder process ID
//! - `hostname`: holder machine
//! - `acquiredAt`: RFC3339 timestamp
//! - `processStartTime`: optional start-time fingerprint of the holder
//!
//! A file missing any required field is treated as "no valid lock".
//!
//! # Stale Locks
//!
//! Records left behind by crashed holders are reclaimed by the next acquirer.
//! See [`staleness`] for the rules.
//!
//! # Release
//!
//! A held [`SessionLock`] removes its record on [`SessionLock::release`] or on
//! drop. [`with_lock`] wraps acquire/run/release into one scoped call.

mod guard;
pub mod process;
mod record;
mod session;
pub mod staleness;
mod status;


// Re-export public API
pub use guard::{with_lock, with_lock_using};
pub use record::{LockRecord, local_hostname};
pub use session::{LockOptions, SessionLock, TryAcquire};
pub use staleness::StaleVerdict;
pub use status::{LockStatus, get_lock_status, get_lock_status_with, list_locks};
