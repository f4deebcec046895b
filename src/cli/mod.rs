//! CLI module for txreplay
//!
//! Provides command-line interface for:
//! - list: Builtin scenarios
//! - validate: Load, validate and print a merged log
//! - state: Replay to a step under one mode
//! - compare: Replay to a step under every mode
//! - play: Timed autoplay with key-moment pauses

mod args;
mod commands;
mod errors;
mod io;

use tracing_subscriber::EnvFilter;

pub use args::{Cli, Command};
pub use commands::{compare, list, play, run_command, state, validate, ModeSummary};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_line, write_response};

/// Main CLI entry point
///
/// Parses arguments, installs logging and dispatches to the command.
/// Failures are also reported as a JSON error line on stdout.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    run_command(cli.command).map_err(|e| {
        // stdout may be the thing that failed; main still reports on stderr.
        let _ = write_error(e.code_str(), e.message());
        e
    })
}

/// Logs go to stderr so stdout stays line-delimited JSON.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
