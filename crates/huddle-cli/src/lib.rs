//! Line-oriented client for Huddle rooms.
//!
//! A thin shell over the `huddle-app` views. Input lines become
//! [`Command`]s, the [`Shell`] routes them to the lobby or room view on
//! screen and hands back plain [`Output`] lines. Terminal I/O stays in the
//! binary so the shell can be driven directly from tests.

#![forbid(unsafe_code)]

pub mod commands;
pub mod error;
pub mod shell;

pub use commands::Command;
pub use error::CliError;
pub use shell::{Output, Shell};
