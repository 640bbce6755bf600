//! CLI argument parsing for mkonce.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mkonce: run a command exactly once per key over shared (NFS) storage.
///
/// State lives entirely on the filesystem:
/// - `<dir>/<name>.lock/` is a mkdir-based cross-node lock
/// - `<dir>/<name>.done` / `<dir>/<name>.failed` record the outcome
#[derive(Parser, Debug)]
#[command(name = "mkonce")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for mkonce.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command at most once per (dir, name).
    ///
    /// Concurrent invocations on the same key, from any process or host
    /// sharing the directory, elect a single executor; the rest wait and
    /// then observe its outcome.
    Run(RunArgs),

    /// Show the guard state for a key: pending, done, or failed.
    Status(KeyArgs),

    /// Clear the done/failed markers for a key, permitting re-execution.
    ///
    /// Do not reset while a `run` on the same key is in flight.
    Reset(KeyArgs),

    /// Lock management commands.
    ///
    /// Inspect or force-clear a lock directory.
    Lock(LockCommand),
}

/// Arguments identifying a guard key.
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Directory the workers share (markers and lock live here).
    pub dir: PathBuf,

    /// Name of the guarded step (e.g. "hdl_compile").
    pub name: String,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory the workers share (markers and lock live here).
    pub dir: PathBuf,

    /// Name of the guarded step (e.g. "hdl_compile").
    pub name: String,

    /// Maximum seconds to wait for the lock. Omit to wait forever.
    #[arg(long)]
    pub timeout_secs: Option<f64>,

    /// The command to run, after `--`.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Show the holder of a lock directory.
    Show(LockShowArgs),

    /// Force-remove a lock directory.
    ///
    /// Requires --force to prevent accidental clearing.
    Clear(LockClearArgs),
}

/// Arguments for the `lock show` command.
#[derive(Parser, Debug)]
pub struct LockShowArgs {
    /// Path of the lock directory.
    pub path: PathBuf,
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Path of the lock directory.
    pub path: PathBuf,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_minimal() {
        let cli =
            Cli::try_parse_from(["mkonce", "run", "/tmp/b", "build", "--", "make", "all"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.dir, PathBuf::from("/tmp/b"));
            assert_eq!(args.name, "build");
            assert_eq!(args.timeout_secs, None);
            assert_eq!(args.command, vec!["make", "all"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_with_timeout() {
        let cli = Cli::try_parse_from([
            "mkonce",
            "run",
            "/tmp/b",
            "build",
            "--timeout-secs",
            "5.5",
            "--",
            "true",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.timeout_secs, Some(5.5));
            assert_eq!(args.command, vec!["true"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_requires_command() {
        assert!(Cli::try_parse_from(["mkonce", "run", "/tmp/b", "build"]).is_err());
    }

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["mkonce", "status", "/tmp/b", "build"]).unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.dir, PathBuf::from("/tmp/b"));
            assert_eq!(args.name, "build");
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn parse_reset() {
        let cli = Cli::try_parse_from(["mkonce", "reset", "/tmp/b", "build"]).unwrap();
        assert!(matches!(cli.command, Command::Reset(_)));
    }

    #[test]
    fn parse_lock_show() {
        let cli = Cli::try_parse_from(["mkonce", "lock", "show", "/tmp/b/build.lock"]).unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            if let LockAction::Show(args) = lock_cmd.action {
                assert_eq!(args.path, PathBuf::from("/tmp/b/build.lock"));
            } else {
                panic!("Expected Show action");
            }
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_clear() {
        let cli =
            Cli::try_parse_from(["mkonce", "lock", "clear", "/tmp/b/build.lock", "--force"])
                .unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            if let LockAction::Clear(args) = lock_cmd.action {
                assert_eq!(args.path, PathBuf::from("/tmp/b/build.lock"));
                assert!(args.force);
            } else {
                panic!("Expected Clear action");
            }
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_clear_without_force() {
        let cli = Cli::try_parse_from(["mkonce", "lock", "clear", "/tmp/b/build.lock"]).unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            if let LockAction::Clear(args) = lock_cmd.action {
                assert!(!args.force);
            } else {
                panic!("Expected Clear action");
            }
        } else {
            panic!("Expected Lock command");
        }
    }
}
