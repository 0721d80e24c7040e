//! CLI argument parsing for cellsync.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cellsync: coordinate processes sharing a file-persisted notebook workspace.
///
/// Session locks live under `.cellsync/locks/` in the workspace root.
/// Notebooks are rewritten atomically and cells get stable identifiers.
#[derive(Parser, Debug)]
#[command(name = "cellsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workspace root (default: nearest ancestor containing `.cellsync/`).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for cellsync.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Session lock inspection and recovery.
    ///
    /// Show, list, or break session locks.
    Lock(LockCommand),

    /// Assign stable identifiers to every cell of a notebook.
    ///
    /// Runs under the notebook's session lock and rewrites the file
    /// atomically. Cells that already carry an identifier keep it.
    Migrate(MigrateArgs),
}

/// Lock subcommand wrapper.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Lock subcommands.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Show the current state of one session lock.
    Status(LockSessionArgs),

    /// List all session locks in the workspace.
    List,

    /// Remove a session lock regardless of its holder.
    Break(LockBreakArgs),
}

/// Arguments naming a session.
#[derive(Parser, Debug)]
pub struct LockSessionArgs {
    /// Session ID (the lock file stem).
    pub session: String,
}

/// Arguments for `lock break`.
#[derive(Parser, Debug)]
pub struct LockBreakArgs {
    /// Session ID (the lock file stem).
    pub session: String,

    /// Required: breaking a live holder's lock can lose its writes.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `migrate` command.
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Path to the notebook file.
    pub notebook: PathBuf,

    /// Document key mixed into identifiers (default: path relative to the workspace root).
    #[arg(long)]
    pub key: Option<String>,

    /// Session lock to hold while migrating (default: notebook file stem).
    #[arg(long)]
    pub session: Option<String>,

    /// Report what would change without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait for the session lock (default: from config).
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
