//! Scoped acquisition with guaranteed release.

use super::session::{LockOptions, SessionLock};
use crate::error::CellsyncError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Acquire the lock at `path`, run `f`, and release before returning.
///
/// Release happens on every exit path: a normal return, an `Err` from `f`,
/// or a panic unwinding through (via the handle's `Drop`). `f`'s outcome is
/// propagated; a release failure is reported only when `f` succeeded.
///
/// # Example
///
/// ```no_run
/// use cellsync::locks::with_lock;
/// use std::time::Duration;
///
/// let saved = with_lock(".cellsync/locks/s1.lock", Duration::from_secs(5), |_lock| {
///     cellsync::fs::durable_write_str("notebooks/s1.json", "{}")?;
///     Ok::<_, cellsync::error::CellsyncError>(true)
/// })?;
/// # Ok::<(), cellsync::error::CellsyncError>(())
/// ```
pub fn with_lock<P, T, E, F>(path: P, timeout: Duration, f: F) -> Result<T, E>
where
    P: Into<PathBuf>,
    E: From<CellsyncError>,
    F: FnOnce(&SessionLock) -> Result<T, E>,
{
    with_lock_using(path, LockOptions::default(), timeout, f)
}

/// [`with_lock`] with explicit staleness and polling options.
pub fn with_lock_using<P, T, E, F>(
    path: P,
    options: LockOptions,
    timeout: Duration,
    f: F,
) -> Result<T, E>
where
    P: Into<PathBuf>,
    E: From<CellsyncError>,
    F: FnOnce(&SessionLock) -> Result<T, E>,
{
    let mut lock = SessionLock::with_options(path, options);
    lock.acquire(timeout)?;

    let outcome = f(&lock);
    let released = lock.release();

    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(E::from(e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            warn!(
                path = %lock.path().display(),
                error = %release_err,
                "failed to release lock after error"
            );
            Err(e)
        }
    }
}
