//! Logging setup for the cellsync binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary so embedding applications keep control of their output.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `cellsync=info`, or
/// `cellsync=debug` when `verbose` is set.
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "cellsync=debug"
    } else {
        "cellsync=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second init (e.g. from tests) is not an error worth surfacing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
