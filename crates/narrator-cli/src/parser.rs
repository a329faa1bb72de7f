//! Root parser and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Speak chess moves aloud through pre-recorded clips or a speech provider.
#[derive(Debug, Parser)]
#[command(name = "narrator")]
#[command(about = "Narrate chess moves through a speech provider")]
#[command(version)]
pub struct Cli {
    /// Settings file (JSON). Defaults to `<config dir>/narrator/settings.json`
    #[arg(long, global = true, env = "NARRATOR_SETTINGS", value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
