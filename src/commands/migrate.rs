//! Implementation of the `cellsync migrate` command.
//!
//! Loads a notebook under its session lock, assigns identifiers to every
//! cell lacking one, and persists the result through the durable writer.

use crate::cli::MigrateArgs;
use crate::context::WorkspaceContext;
use crate::document::Document;
use crate::error::{CellsyncError, Result};
use crate::identity::{IdentityAssigner, MigrationReport};
use crate::locks::{LockOptions, with_lock_using};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

pub(super) fn cmd_migrate(ctx: &WorkspaceContext, args: MigrateArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let notebook = std::path::absolute(&args.notebook).map_err(|e| {
        CellsyncError::UserError(format!(
            "invalid notebook path '{}': {}",
            args.notebook.display(),
            e
        ))
    })?;

    let session = match args.session {
        Some(session) => session,
        None => default_session(&notebook)?,
    };
    let key = args
        .key
        .unwrap_or_else(|| default_document_key(&ctx.root, &notebook));
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.lock_timeout());

    let lock_path = ctx.session_lock_path(&session)?;
    let assigner = IdentityAssigner::from(&config);

    let report = with_lock_using(lock_path, LockOptions::from(&config), timeout, |_lock| {
        migrate_file(&assigner, &notebook, &key, args.dry_run)
    })?;

    print_report(&notebook, &report, args.dry_run);
    Ok(())
}

/// Load, migrate and (unless `dry_run`) persist a single notebook.
///
/// The file is rewritten only when at least one cell changed.
pub(crate) fn migrate_file(
    assigner: &IdentityAssigner,
    notebook: &Path,
    key: &str,
    dry_run: bool,
) -> Result<MigrationReport> {
    let mut document = Document::load(notebook)?;
    let report = assigner.migrate_document(&mut document, key);
    if report.changed() && !dry_run {
        document.save(notebook)?;
    }
    Ok(report)
}

fn default_session(notebook: &Path) -> Result<String> {
    notebook
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CellsyncError::UserError(format!(
                "cannot derive a session ID from '{}'. Pass --session",
                notebook.display()
            ))
        })
}

/// Path relative to the workspace root with `/` separators, or the full
/// path when the notebook lives outside the workspace.
fn default_document_key(root: &Path, notebook: &Path) -> String {
    let relative: PathBuf = notebook
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| notebook.to_path_buf());

    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn print_report(notebook: &Path, report: &MigrationReport, dry_run: bool) {
    if !report.changed() {
        println!(
            "All cells in {} already have identifiers (format {}).",
            notebook.display(),
            report.version_after
        );
        return;
    }

    let verb = if dry_run { "Would migrate" } else { "Migrated" };
    println!(
        "{} {} cell(s) in {} (format {} -> {}).",
        verb,
        report.migrated,
        notebook.display(),
        report.version_before,
        report.version_after
    );
}
