//! mkonce: run a command exactly once per key over shared (NFS) storage.
//!
//! This is the entry point for the `mkonce` CLI. It initializes logging,
//! parses arguments, dispatches to the appropriate command handler, and
//! maps errors to exit codes.

mod cli;
mod commands;

use cli::Cli;
use mkonce::exit_codes;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Log to stderr; level controlled by MKONCE_LOG (e.g. "debug"),
    // warnings and errors by default.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MKONCE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
