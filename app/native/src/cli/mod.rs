//! CLI module for Tessera.
//!
//! The command line is the only shell around the engine: it loads the
//! configuration, installs logging and drives the engine on a Tokio runtime.

mod commands;
mod output;

use clap::Parser;
pub use commands::{Cli, Commands};
pub use output::format_error;

use crate::error::TesseraError;
use crate::logging;

/// Runs the CLI.
///
/// Parses command-line arguments, installs logging and executes the
/// appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), TesseraError> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    cli.execute()
}
