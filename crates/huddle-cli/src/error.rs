//! CLI errors.

use std::io;

use huddle_harness::HarnessError;
use thiserror::Error;

/// Errors that end the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading input or writing output failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The in-process network could not be set up.
    #[error("loopback network: {0}")]
    Network(#[from] HarnessError),
}
