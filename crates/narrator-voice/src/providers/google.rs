//! Google Cloud Text-to-Speech.
//!
//! Synthesis returns MP3 as base64 inside a JSON body.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use narrator_core::{NarrationUnit, ProviderConfig, ProviderId};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{api_base, fetch_json};
use super::{SpeechProvider, VoiceGender, VoiceInfo};
use crate::audio::{AudioClip, AudioFormat, PlayableAudio};
use crate::cache::{AudioCache, CacheKey};
use crate::error::VoiceError;

pub const GOOGLE_TTS_API_URL: &str = "https://texttospeech.googleapis.com";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    audio_content: String,
}

#[derive(Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<RemoteVoice>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteVoice {
    name: String,
    #[serde(default)]
    language_codes: Vec<String>,
    ssml_gender: Option<String>,
}

fn decode_audio(response: &SynthesisResponse) -> Result<AudioClip, VoiceError> {
    let bytes = STANDARD
        .decode(response.audio_content.as_bytes())
        .map_err(|e| VoiceError::InvalidResponse {
            provider: ProviderId::Google,
            reason: format!("audioContent is not base64: {e}"),
        })?;
    if bytes.is_empty() {
        return Err(VoiceError::InvalidResponse {
            provider: ProviderId::Google,
            reason: "empty audioContent".to_string(),
        });
    }
    Ok(AudioClip::new(bytes, AudioFormat::Mp3))
}

pub struct GoogleProvider {
    client: Client,
    cache: Arc<AudioCache>,
}

impl GoogleProvider {
    pub const fn new(client: Client, cache: Arc<AudioCache>) -> Self {
        Self { client, cache }
    }
}

#[async_trait]
impl SpeechProvider for GoogleProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    async fn resolve(
        &self,
        unit: &NarrationUnit,
        config: &ProviderConfig,
    ) -> Result<PlayableAudio, VoiceError> {
        let api_key = config
            .api_key()
            .ok_or(VoiceError::MissingApiKey(ProviderId::Google))?;
        let text = unit.spoken_text();
        let base = api_base(config, GOOGLE_TTS_API_URL);
        let url = format!("{base}/v1/text:synthesize");

        let request = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&SynthesisRequest {
                input: SynthesisInput { text: &text },
                voice: VoiceSelection {
                    language_code: &config.language,
                    name: &config.voice,
                },
                audio_config: AudioConfig {
                    audio_encoding: "MP3",
                },
            });

        let key = CacheKey::text(ProviderId::Google, &base, &config.voice, &text);
        let clip = self
            .cache
            .fetch_or_synthesize(key, move || async move {
                let response: SynthesisResponse = fetch_json(ProviderId::Google, request).await?;
                decode_audio(&response)
            })
            .await
            .ok_or_else(|| VoiceError::Unavailable(text))?;

        Ok(PlayableAudio::Clip(clip))
    }

    async fn list_voices(&self, config: &ProviderConfig) -> Result<Vec<VoiceInfo>, VoiceError> {
        let api_key = config
            .api_key()
            .ok_or(VoiceError::MissingApiKey(ProviderId::Google))?;
        let url = format!("{}/v1/voices", api_base(config, GOOGLE_TTS_API_URL));
        let response: VoicesResponse = fetch_json(
            ProviderId::Google,
            self.client
                .get(url)
                .query(&[("key", api_key), ("languageCode", config.language.as_str())]),
        )
        .await?;

        Ok(response
            .voices
            .into_iter()
            .map(|v| VoiceInfo {
                language: v.language_codes.into_iter().next().unwrap_or_default(),
                gender: v.ssml_gender.as_deref().and_then(VoiceGender::from_label),
                id: v.name.clone(),
                name: v.name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_wire_shape() {
        let body = SynthesisRequest {
            input: SynthesisInput { text: "Bishop c4" },
            voice: VoiceSelection {
                language_code: "en-US",
                name: "en-US-Neural2-D",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["input"]["text"], "Bishop c4");
        assert_eq!(json["voice"]["languageCode"], "en-US");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
    }

    #[test]
    fn decodes_base64_audio() {
        let response = SynthesisResponse {
            audio_content: STANDARD.encode(b"ID3fake"),
        };
        let clip = decode_audio(&response).unwrap();
        assert_eq!(clip.bytes(), b"ID3fake");
        assert_eq!(clip.format(), AudioFormat::Mp3);
    }

    #[test]
    fn rejects_garbage_audio_content() {
        let response = SynthesisResponse {
            audio_content: "not base64!!".to_string(),
        };
        assert!(matches!(
            decode_audio(&response),
            Err(VoiceError::InvalidResponse { .. })
        ));
    }
}
