//! Narration engine: audio cache, speech providers, playback sequencing
//! and local audio output.
//!
//! ```text
//! NarrationSession
//!   ├── PlaybackSequencer ── AudioOutput (rodio + OS speech thread)
//!   └── ProviderGateway
//!         ├── cloud clips ─┐
//!         ├── ElevenLabs  ─┤
//!         ├── Google      ─┼── AudioCache (single-flight)
//!         ├── KittenTTS   ─┤
//!         ├── OpenTTS     ─┘
//!         └── system voice
//! ```

#![deny(unused_crate_dependencies)]

pub mod audio;
pub mod cache;
pub mod context;
pub mod error;
pub mod gateway;
pub mod output;
pub mod providers;
pub mod sequencer;
pub mod session;

pub use audio::{AudioClip, AudioFormat, PlayableAudio, PlaybackParams};
pub use cache::{AudioCache, CacheKey};
pub use context::{HTTP_TIMEOUT, NarrationContext};
pub use error::VoiceError;
pub use gateway::ProviderGateway;
pub use output::{AudioOutput, LocalAudioOutput};
pub use providers::{SpeechProvider, VoiceGender, VoiceInfo};
pub use sequencer::{PlaybackOutcome, PlaybackSequencer};
pub use session::NarrationSession;

#[cfg(test)]
use axum as _;
#[cfg(test)]
use tokio_test as _;
