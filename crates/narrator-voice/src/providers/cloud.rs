//! Pre-recorded clip service.
//!
//! Clips live at `{base}/{voice}/{language}/{path}.mp3`. Only clip units are
//! supported; a clip the service does not have is reported unavailable and
//! the unit is skipped.

use async_trait::async_trait;
use narrator_core::{ClipPath, NarrationUnit, ProviderConfig, ProviderId, UnitContent};
use reqwest::Client;
use std::sync::Arc;

use super::http::fetch_audio;
use super::{SpeechProvider, VoiceGender, VoiceInfo};
use crate::audio::{AudioFormat, PlayableAudio};
use crate::cache::{AudioCache, CacheKey};
use crate::error::VoiceError;

/// Voices recorded for the clip service.
const CLIP_VOICES: &[(&str, &str, VoiceGender)] = &[("daniel", "Daniel", VoiceGender::Male)];

pub struct CloudClipProvider {
    client: Client,
    cache: Arc<AudioCache>,
}

impl CloudClipProvider {
    pub const fn new(client: Client, cache: Arc<AudioCache>) -> Self {
        Self { client, cache }
    }

    /// URL of one clip.
    pub fn clip_url(config: &ProviderConfig, path: &ClipPath) -> Option<String> {
        let base = config.effective_base_url(ProviderId::Cloud)?;
        Some(format!(
            "{base}/{}/{}/{path}.mp3",
            config.voice, config.language
        ))
    }
}

#[async_trait]
impl SpeechProvider for CloudClipProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Cloud
    }

    async fn resolve(
        &self,
        unit: &NarrationUnit,
        config: &ProviderConfig,
    ) -> Result<PlayableAudio, VoiceError> {
        let UnitContent::Clip { path } = unit.content() else {
            return Err(VoiceError::UnsupportedUnit {
                provider: ProviderId::Cloud,
                what: "free text",
            });
        };
        let url = Self::clip_url(config, path).ok_or_else(|| VoiceError::InvalidResponse {
            provider: ProviderId::Cloud,
            reason: "no base URL configured".to_string(),
        })?;

        let endpoint = config
            .effective_base_url(ProviderId::Cloud)
            .unwrap_or_default();
        let key = CacheKey::clip(
            ProviderId::Cloud,
            &endpoint,
            &config.voice,
            &config.language,
            path,
        );
        let client = self.client.clone();
        let clip = self
            .cache
            .fetch_or_synthesize(key, move || {
                fetch_audio(ProviderId::Cloud, client.get(url), AudioFormat::Mp3)
            })
            .await
            .ok_or_else(|| VoiceError::Unavailable(path.to_string()))?;

        Ok(PlayableAudio::Clip(clip))
    }

    async fn list_voices(&self, config: &ProviderConfig) -> Result<Vec<VoiceInfo>, VoiceError> {
        Ok(CLIP_VOICES
            .iter()
            .map(|(id, name, gender)| VoiceInfo {
                id: (*id).to_string(),
                name: (*name).to_string(),
                language: config.language.clone(),
                gender: Some(*gender),
            })
            .collect())
    }
}
