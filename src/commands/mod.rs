//! Command implementations for cellsync.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations and resolves the workspace every command runs against.

mod lock;
mod migrate;


use crate::cli::{Cli, Command, LockAction, LockCommand};
use crate::context::WorkspaceContext;
use crate::error::{CellsyncError, Result};
use std::path::Path;

/// Dispatch a parsed command line to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let ctx = resolve_workspace(cli.root.as_deref())?;
    match cli.command {
        Command::Lock(lock_cmd) => dispatch_lock(&ctx, lock_cmd),
        Command::Migrate(args) => migrate::cmd_migrate(&ctx, args),
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(ctx: &WorkspaceContext, lock_cmd: LockCommand) -> Result<()> {
    match lock_cmd.action {
        LockAction::Status(args) => lock::cmd_lock_status(ctx, args),
        LockAction::List => lock::cmd_lock_list(ctx),
        LockAction::Break(args) => lock::cmd_lock_break(ctx, args),
    }
}

/// An explicit `--root` is used as-is; otherwise search up from the working directory.
fn resolve_workspace(root: Option<&Path>) -> Result<WorkspaceContext> {
    match root {
        Some(root) => {
            let root = std::path::absolute(root).map_err(|e| {
                CellsyncError::UserError(format!(
                    "invalid workspace root '{}': {}",
                    root.display(),
                    e
                ))
            })?;
            Ok(WorkspaceContext::at(root))
        }
        None => WorkspaceContext::resolve(),
    }
}
