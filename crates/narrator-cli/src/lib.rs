//! `narrator` command-line front end.
//!
//! Parses arguments, builds the settings snapshot and wires the runtime
//! supervisor, lifecycle manager and narration session together in
//! [`bootstrap`]. Handlers in [`handlers`] do one command each.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary only.
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliContext, bootstrap, load_settings};
pub use commands::{Commands, ServerCommand};
pub use error::CliError;
pub use parser::Cli;
