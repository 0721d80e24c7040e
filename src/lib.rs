//! Cellsync: state coordination for a shared, file-persisted notebook workspace.
//!
//! Several independent processes may open the same workspace at once. This
//! crate gives them three primitives to stay consistent:
//!
//! - [`locks`]: cross-process session locks with stale-holder recovery
//! - [`fs`]: validated, crash-safe replacement of structured files
//! - [`identity`]: content-derived cell identifiers and document migration

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod identity;
pub mod locks;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_support;
