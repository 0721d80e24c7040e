//! Implementation of the `cellsync lock` subcommands.

use crate::cli::{LockBreakArgs, LockSessionArgs};
use crate::context::WorkspaceContext;
use crate::error::{CellsyncError, Result};
use crate::locks::{self, LockOptions, LockRecord, LockStatus, SessionLock};

pub(super) fn cmd_lock_status(ctx: &WorkspaceContext, args: LockSessionArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let path = ctx.session_lock_path(&args.session)?;

    let status = locks::get_lock_status_with(&path, &LockOptions::from(&config));

    if !status.locked {
        println!("Session '{}' is not locked.", args.session);
        println!("  Path:       {}", status.path.display());
        return Ok(());
    }

    println!("Session '{}' is locked.", args.session);
    println!();
    print_status(&status);
    Ok(())
}

pub(super) fn cmd_lock_list(ctx: &WorkspaceContext) -> Result<()> {
    let config = ctx.load_config()?;
    let locks = locks::list_locks(&ctx.locks_dir, &LockOptions::from(&config))?;
    let held: Vec<_> = locks.iter().filter(|l| l.locked).collect();

    if held.is_empty() {
        println!("No active locks.");
        return Ok(());
    }

    println!("Active locks ({}):", held.len());
    println!();

    for status in &held {
        println!("  {}:", status.name);
        print_status_indented(status, "    ");
        println!();
    }

    let stale_count = held.iter().filter(|l| l.can_break).count();
    if stale_count > 0 {
        println!(
            "Note: {} lock(s) are stale and will be reclaimed by the next acquirer.",
            stale_count
        );
    }

    Ok(())
}

pub(super) fn cmd_lock_break(ctx: &WorkspaceContext, args: LockBreakArgs) -> Result<()> {
    if !args.force {
        return Err(CellsyncError::UserError(
            "refusing to break lock without --force flag.\n\n\
             Breaking a lock while its holder is still running lets two writers\n\
             modify the same notebook. Only break locks whose holder has crashed.\n\n\
             To break the lock, run:\n  cellsync lock break {} --force"
                .replace("{}", &args.session),
        ));
    }

    let config = ctx.load_config()?;
    let path = ctx.session_lock_path(&args.session)?;
    let mut lock = SessionLock::with_options(&path, LockOptions::from(&config));

    match lock.force_break()? {
        Some(record) => {
            println!("Broke lock: {}", args.session);
            println!();
            println!("Lock details:");
            print_record(&record, "  ");
            println!("  Path:       {}", path.display());
        }
        None => println!("No lock to break for session '{}'.", args.session),
    }

    Ok(())
}

fn print_status(status: &LockStatus) {
    print_status_indented(status, "  ");
}

fn print_status_indented(status: &LockStatus, indent: &str) {
    if let Some(record) = &status.record {
        print_record(record, indent);
    }
    if let Some(verdict) = &status.verdict {
        let marker = if status.can_break { "STALE" } else { "live" };
        println!("{}Status:     {} ({})", indent, marker, verdict);
    }
    if status.owned_by_current_process {
        println!("{}Owner:      this process", indent);
    }
    println!("{}Path:       {}", indent, status.path.display());
}

fn print_record(record: &LockRecord, indent: &str) {
    println!("{}Lock ID:    {}", indent, record.lock_id);
    println!("{}PID:        {}", indent, record.pid);
    println!("{}Host:       {}", indent, record.hostname);
    println!(
        "{}Acquired:   {}",
        indent,
        record.acquired_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{}Age:        {}", indent, record.age_string());
}
