//! Filesystem utilities for cellsync.
//!
//! This module provides the durable writer used for every mutation of
//! persisted workspace state, plus the structured-format checks it runs
//! before committing content.

pub mod atomic;
pub mod format;

pub use atomic::{durable_write, durable_write_str};
pub use format::StructuredFormat;
