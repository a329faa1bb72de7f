//! Narration engine error types.

use narrator_core::{LocalServer, ProviderId};

/// Errors that can occur while resolving or playing narration audio.
///
/// None of these escape a narration sequence: the sequencer logs them and
/// skips the unit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VoiceError {
    /// The request never got a response (DNS, connect, timeout, body read).
    #[error("Network request failed: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("{provider} returned HTTP {status}")]
    HttpStatus { provider: ProviderId, status: u16 },

    /// The response body was not what the provider promised.
    #[error("Unexpected response from {provider}: {reason}")]
    InvalidResponse { provider: ProviderId, reason: String },

    /// A fetch for this unit failed earlier and nothing was cached.
    #[error("Audio unavailable for '{0}'")]
    Unavailable(String),

    /// Audio bytes could not be decoded or played.
    #[error("Audio decode failed: {0}")]
    Decode(String),

    /// A commercial provider was selected without an API key.
    #[error("{0} requires an API key")]
    MissingApiKey(ProviderId),

    /// The self-hosted server is not in the `running` state.
    #[error("{} server is not running", .0.display_name())]
    ProviderNotReady(LocalServer),

    /// The provider cannot speak this kind of unit.
    #[error("{provider} cannot speak {what}")]
    UnsupportedUnit {
        provider: ProviderId,
        what: &'static str,
    },

    /// No implementation is registered for the provider id.
    #[error("No speech provider registered for {0}")]
    NoProvider(ProviderId),

    /// Failed to open the audio output device.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The OS speech engine failed or is unavailable.
    #[error("System voice error: {0}")]
    SystemVoice(String),

    /// The dedicated audio thread is gone.
    #[error("Audio thread is not running")]
    AudioThreadDied,
}

impl VoiceError {
    pub(crate) fn network(err: &reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }

    /// Whether this is the expected "server not started" condition rather
    /// than a real failure.
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::ProviderNotReady(_))
    }
}
