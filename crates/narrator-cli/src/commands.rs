//! Subcommands.

use clap::Subcommand;
use narrator_core::{LocalServer, ProviderId};

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the clip paths and spoken text for a move, without audio
    Translate {
        /// Move in standard algebraic notation (e.g. "Nxe4+", "O-O")
        san: String,
        /// Move-quality symbol such as "!!" or "?" (repeatable)
        #[arg(short, long = "annotation", value_name = "SYM")]
        annotations: Vec<String>,
    },

    /// Narrate a move through the active provider
    Say {
        /// Move in standard algebraic notation
        san: String,
        /// Half-moves played so far, used for the move number (0 = none)
        #[arg(long, default_value_t = 0, value_name = "N")]
        half_moves: u32,
        /// Move-quality symbol such as "!!" or "?" (repeatable)
        #[arg(short, long = "annotation", value_name = "SYM")]
        annotations: Vec<String>,
        /// Commentary spoken after the move (speech providers only)
        #[arg(short, long)]
        comment: Option<String>,
        /// Use this provider instead of the configured one
        #[arg(short, long)]
        provider: Option<ProviderId>,
    },

    /// Speak free text through the active provider
    Speak {
        /// Text to speak
        text: String,
        /// Use this provider instead of the configured one
        #[arg(short, long)]
        provider: Option<ProviderId>,
    },

    /// Play the short test sequence
    Demo,

    /// List the voices a provider offers
    Voices {
        /// Provider to ask (defaults to the configured one)
        #[arg(short, long)]
        provider: Option<ProviderId>,
    },

    /// Manage the self-hosted speech servers
    #[command(subcommand)]
    Server(ServerCommand),
}

/// Self-hosted server management.
#[derive(Debug, Subcommand)]
pub enum ServerCommand {
    /// Run the dependency checks for a server
    Check {
        /// kittentts or opentts
        server: LocalServer,
    },

    /// Install what a server needs (virtual environment or docker image)
    Setup {
        /// kittentts or opentts
        server: LocalServer,
    },

    /// Start a server and keep it running until interrupted
    Start {
        /// kittentts or opentts
        server: LocalServer,
        /// CPU threads for local inference (KittenTTS only)
        #[arg(long, value_name = "N")]
        threads: Option<u32>,
    },

    /// Stop a server
    Stop {
        /// kittentts or opentts
        server: LocalServer,
    },
}
