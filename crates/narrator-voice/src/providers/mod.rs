//! Speech providers: one implementation per [`ProviderId`].
//!
//! Each provider turns a [`NarrationUnit`] into [`PlayableAudio`], going
//! through the shared [`AudioCache`](crate::cache::AudioCache) for anything
//! that needs network I/O.
//!
//! | Provider     | Module            | Units  | Cached |
//! |--------------|-------------------|--------|--------|
//! | `cloud`      | [`cloud`]         | clips  |   ✓    |
//! | `elevenlabs` | [`elevenlabs`]    | text   |   ✓    |
//! | `google`     | [`google`]        | text   |   ✓    |
//! | `system`     | [`system`]        | text   |        |
//! | `kittentts`  | [`self_hosted`]   | text   |   ✓    |
//! | `opentts`    | [`self_hosted`]   | text   |   ✓    |

pub mod cloud;
pub mod elevenlabs;
pub mod google;
mod http;
pub mod self_hosted;
pub mod system;

use async_trait::async_trait;
use narrator_core::{NarrationUnit, ProviderConfig, ProviderId};

use crate::audio::PlayableAudio;
use crate::error::VoiceError;

pub use cloud::CloudClipProvider;
pub use elevenlabs::ElevenLabsProvider;
pub use google::GoogleProvider;
pub use self_hosted::SelfHostedProvider;
pub use system::SystemVoiceProvider;

// ── Shared types ───────────────────────────────────────────────────

/// Information about an available voice.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    /// Voice identifier (used in API calls).
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// Language code or accent label.
    pub language: String,

    /// Gender, when the provider reports one.
    pub gender: Option<VoiceGender>,
}

/// Voice gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoiceGender {
    Female,
    Male,
}

impl VoiceGender {
    /// Parse the loose labels providers use (`MALE`, `female`, `m`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Some(Self::Female),
            "male" | "m" => Some(Self::Male),
            _ => None,
        }
    }
}

// ── Provider trait ─────────────────────────────────────────────────

/// A speech backend.
///
/// Implementations must be `Send + Sync`; the gateway holds them behind
/// `Arc` and resolves units for one sequence concurrently.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Turn one unit into playable audio.
    ///
    /// `config` is a read-only snapshot of the provider's settings.
    async fn resolve(
        &self,
        unit: &NarrationUnit,
        config: &ProviderConfig,
    ) -> Result<PlayableAudio, VoiceError>;

    /// Voices the provider offers.
    async fn list_voices(&self, config: &ProviderConfig) -> Result<Vec<VoiceInfo>, VoiceError>;
}
