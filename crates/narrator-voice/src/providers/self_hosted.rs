//! Self-hosted speech servers (KittenTTS, OpenTTS).
//!
//! Both expose the same small HTTP API:
//!
//! - `GET {base}/api/tts?text=…&voice=…` returns WAV
//! - `GET {base}/api/voices` returns a map of voice id to details
//!
//! Liveness comes from the lifecycle manager's state, never from probing
//! the server: a server that is not `running` fails fast with
//! [`VoiceError::ProviderNotReady`] and no request is sent.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use narrator_core::{LocalServer, NarrationUnit, ProviderConfig, ProviderId, ServerReadiness};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{fetch_audio, fetch_json};
use super::{SpeechProvider, VoiceGender, VoiceInfo};
use crate::audio::{AudioFormat, PlayableAudio};
use crate::cache::{AudioCache, CacheKey};
use crate::error::VoiceError;

#[derive(Deserialize)]
struct RemoteVoice {
    #[serde(default)]
    name: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    gender: Option<String>,
}

fn voices_from_map(map: BTreeMap<String, RemoteVoice>) -> Vec<VoiceInfo> {
    map.into_iter()
        .map(|(id, v)| VoiceInfo {
            name: if v.name.is_empty() { id.clone() } else { v.name },
            language: v.language,
            gender: v.gender.as_deref().and_then(VoiceGender::from_label),
            id,
        })
        .collect()
}

pub struct SelfHostedProvider {
    server: LocalServer,
    client: Client,
    cache: Arc<AudioCache>,
    readiness: Arc<dyn ServerReadiness>,
}

impl SelfHostedProvider {
    pub fn new(
        server: LocalServer,
        client: Client,
        cache: Arc<AudioCache>,
        readiness: Arc<dyn ServerReadiness>,
    ) -> Self {
        Self {
            server,
            client,
            cache,
            readiness,
        }
    }

    pub fn kittentts(client: Client, cache: Arc<AudioCache>, readiness: Arc<dyn ServerReadiness>) -> Self {
        Self::new(LocalServer::KittenTts, client, cache, readiness)
    }

    pub fn opentts(client: Client, cache: Arc<AudioCache>, readiness: Arc<dyn ServerReadiness>) -> Self {
        Self::new(LocalServer::OpenTts, client, cache, readiness)
    }

    fn ensure_ready(&self) -> Result<(), VoiceError> {
        if self.readiness.is_running(self.server) {
            Ok(())
        } else {
            debug!(server = %self.server, "Server not running, skipping request");
            Err(VoiceError::ProviderNotReady(self.server))
        }
    }

    fn base_url(&self, config: &ProviderConfig) -> Result<String, VoiceError> {
        config
            .effective_base_url(self.id())
            .ok_or_else(|| VoiceError::InvalidResponse {
                provider: self.id(),
                reason: "no server URL configured".to_string(),
            })
    }
}

#[async_trait]
impl SpeechProvider for SelfHostedProvider {
    fn id(&self) -> ProviderId {
        self.server.provider_id()
    }

    async fn resolve(
        &self,
        unit: &NarrationUnit,
        config: &ProviderConfig,
    ) -> Result<PlayableAudio, VoiceError> {
        self.ensure_ready()?;

        let provider = self.id();
        let text = unit.spoken_text();
        let base = self.base_url(config)?;
        let url = format!("{base}/api/tts");
        let request = self
            .client
            .get(url)
            .query(&[("text", text.as_str()), ("voice", config.voice.as_str())]);

        let key = CacheKey::text(provider, &base, &config.voice, &text);
        let clip = self
            .cache
            .fetch_or_synthesize(key, move || fetch_audio(provider, request, AudioFormat::Wav))
            .await
            .ok_or_else(|| VoiceError::Unavailable(text))?;

        Ok(PlayableAudio::Clip(clip))
    }

    async fn list_voices(&self, config: &ProviderConfig) -> Result<Vec<VoiceInfo>, VoiceError> {
        self.ensure_ready()?;

        let url = format!("{}/api/voices", self.base_url(config)?);
        let mut request = self.client.get(url);
        if self.server == LocalServer::OpenTts {
            request = request.query(&[("language", config.language.as_str())]);
        }
        let map: BTreeMap<String, RemoteVoice> = fetch_json(self.id(), request).await?;
        Ok(voices_from_map(map))
    }
}
