//! ElevenLabs text-to-speech.

use std::sync::Arc;

use async_trait::async_trait;
use narrator_core::{NarrationUnit, ProviderConfig, ProviderId};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{api_base, fetch_audio, fetch_json};
use super::{SpeechProvider, VoiceGender, VoiceInfo};
use crate::audio::{AudioFormat, PlayableAudio};
use crate::cache::{AudioCache, CacheKey};
use crate::error::VoiceError;

pub const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io";

/// Low-latency multilingual model.
const MODEL_ID: &str = "eleven_turbo_v2_5";

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<RemoteVoice>,
}

#[derive(Deserialize)]
struct RemoteVoice {
    voice_id: String,
    name: String,
    #[serde(default)]
    labels: Labels,
}

#[derive(Default, Deserialize)]
struct Labels {
    accent: Option<String>,
    gender: Option<String>,
}

pub struct ElevenLabsProvider {
    client: Client,
    cache: Arc<AudioCache>,
}

impl ElevenLabsProvider {
    pub const fn new(client: Client, cache: Arc<AudioCache>) -> Self {
        Self { client, cache }
    }

    fn api_key(config: &ProviderConfig) -> Result<String, VoiceError> {
        config
            .api_key()
            .map(str::to_string)
            .ok_or(VoiceError::MissingApiKey(ProviderId::ElevenLabs))
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::ElevenLabs
    }

    async fn resolve(
        &self,
        unit: &NarrationUnit,
        config: &ProviderConfig,
    ) -> Result<PlayableAudio, VoiceError> {
        let api_key = Self::api_key(config)?;
        let text = unit.spoken_text();
        let base = api_base(config, ELEVENLABS_API_URL);
        let url = format!("{base}/v1/text-to-speech/{}", config.voice);

        let key = CacheKey::text(ProviderId::ElevenLabs, &base, &config.voice, &text);
        let request = self
            .client
            .post(url)
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&SynthesisRequest {
                text: &text,
                model_id: MODEL_ID,
            });
        let clip = self
            .cache
            .fetch_or_synthesize(key, move || {
                fetch_audio(ProviderId::ElevenLabs, request, AudioFormat::Mp3)
            })
            .await
            .ok_or_else(|| VoiceError::Unavailable(text))?;

        Ok(PlayableAudio::Clip(clip))
    }

    async fn list_voices(&self, config: &ProviderConfig) -> Result<Vec<VoiceInfo>, VoiceError> {
        let api_key = Self::api_key(config)?;
        let url = format!("{}/v1/voices", api_base(config, ELEVENLABS_API_URL));
        let response: VoicesResponse = fetch_json(
            ProviderId::ElevenLabs,
            self.client.get(url).header("xi-api-key", api_key),
        )
        .await?;

        Ok(response
            .voices
            .into_iter()
            .map(|v| VoiceInfo {
                id: v.voice_id,
                name: v.name,
                language: v.labels.accent.unwrap_or_default(),
                gender: v.labels.gender.as_deref().and_then(VoiceGender::from_label),
            })
            .collect())
    }
}
