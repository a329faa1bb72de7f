//! CLI error type and exit codes.

use narrator_core::{LifecycleError, SettingsError, UnknownProvider};
use narrator_voice::VoiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Narration failed.
    #[error("{0}")]
    Narration(String),

    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (settings file unreadable, no audio device, ...).
    #[error("IO error: {0}")]
    Io(String),

    /// Settings file or environment is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A self-hosted server could not be set up, started or stopped.
    #[error("Server error: {0}")]
    Server(String),
}

impl CliError {
    /// Exit code for this error, following sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Narration(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Server(_) => 71,   // EX_OSERR
        }
    }
}

impl From<VoiceError> for CliError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::OutputStreamError(_) | VoiceError::AudioThreadDied => Self::Io(err.to_string()),
            other => Self::Narration(other.to_string()),
        }
    }
}

impl From<LifecycleError> for CliError {
    fn from(err: LifecycleError) -> Self {
        Self::Server(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<UnknownProvider> for CliError {
    fn from(err: UnknownProvider) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
