//! Command implementations for the mkonce CLI.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Handlers are thin wrappers over the library: the guard
//! and lock machinery lives in `mkonce::guard` and `mkonce::lock`.

use crate::cli::{Command, KeyArgs, LockAction, LockClearArgs, LockCommand, LockShowArgs, RunArgs};
use mkonce::error::{MkonceError, Result};
use mkonce::guard::OnceGuard;
use mkonce::lock::{self, LockStatus};
use std::process::Command as Process;
use std::time::Duration;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => cmd_run(args),
        Command::Status(args) => cmd_status(args),
        Command::Reset(args) => cmd_reset(args),
        Command::Lock(lock_cmd) => dispatch_lock(lock_cmd),
    }
}

fn dispatch_lock(lock_cmd: LockCommand) -> Result<()> {
    match lock_cmd.action {
        LockAction::Show(args) => cmd_lock_show(args),
        LockAction::Clear(args) => cmd_lock_clear(args),
    }
}

/// Run a command at most once per `(dir, name)`.
fn cmd_run(args: RunArgs) -> Result<()> {
    let timeout = parse_timeout(args.timeout_secs)?;
    let guard = OnceGuard::new(&args.dir, &args.name)?.timeout(timeout);

    guard.ensure_done(|| run_command(&args.command))?;
    println!("{}: done", args.name);
    Ok(())
}

/// Show the guard state for a key.
fn cmd_status(args: KeyArgs) -> Result<()> {
    let guard = OnceGuard::new(&args.dir, &args.name)?;
    println!("{}: {}", args.name, guard.state());
    Ok(())
}

/// Clear the markers for a key.
fn cmd_reset(args: KeyArgs) -> Result<()> {
    let guard = OnceGuard::new(&args.dir, &args.name)?;
    guard.reset()?;
    println!("{}: reset", args.name);
    Ok(())
}

/// Show the holder of a lock directory.
fn cmd_lock_show(args: LockShowArgs) -> Result<()> {
    match lock::inspect(&args.path) {
        LockStatus::Free => println!("{}: free", args.path.display()),
        LockStatus::Held(holder) => println!(
            "{}: held by {}@{} (age: {})",
            args.path.display(),
            holder.pid,
            holder.hostname,
            holder.age_string()
        ),
        LockStatus::HeldUnknown => println!(
            "{}: held, holder record missing or unreadable",
            args.path.display()
        ),
    }
    Ok(())
}

/// Force-remove a lock directory.
fn cmd_lock_clear(args: LockClearArgs) -> Result<()> {
    if !args.force {
        return Err(MkonceError::UserError(
            "clearing a lock may unleash a second executor; pass --force to proceed".to_string(),
        ));
    }

    let status = lock::force_clear(&args.path)?;
    match status {
        LockStatus::Held(holder) => println!(
            "cleared {} (was held by {}@{}, age: {})",
            args.path.display(),
            holder.pid,
            holder.hostname,
            holder.age_string()
        ),
        _ => println!("cleared {}", args.path.display()),
    }
    Ok(())
}

/// Convert the CLI timeout to the lock's representation.
///
/// Omitted means wait forever; zero and negative values are rejected
/// rather than silently behaving like "fail immediately".
fn parse_timeout(timeout_secs: Option<f64>) -> Result<Option<Duration>> {
    match timeout_secs {
        None => Ok(None),
        Some(secs) if secs.is_finite() && secs > 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
        Some(secs) => Err(MkonceError::UserError(format!(
            "invalid --timeout-secs {}: must be a positive number",
            secs
        ))),
    }
}

/// Run the guarded command, inheriting stdio so build output stays visible.
fn run_command(command: &[String]) -> std::result::Result<(), String> {
    let (program, cmd_args) = command
        .split_first()
        .ok_or_else(|| "empty command".to_string())?;

    let status = Process::new(program)
        .args(cmd_args)
        .status()
        .map_err(|e| format!("failed to run '{}': {}", program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(format!("command '{}' failed: {}", program, status))
    }
}
