//! Operating-system speech engine.
//!
//! Nothing is fetched or cached: units resolve to an utterance that the
//! audio output hands to the engine.

use std::sync::Arc;

use async_trait::async_trait;
use narrator_core::{NarrationUnit, ProviderConfig, ProviderId};

use super::{SpeechProvider, VoiceInfo};
use crate::audio::PlayableAudio;
use crate::error::VoiceError;
use crate::output::AudioOutput;

pub struct SystemVoiceProvider {
    output: Arc<dyn AudioOutput>,
}

impl SystemVoiceProvider {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self { output }
    }
}

#[async_trait]
impl SpeechProvider for SystemVoiceProvider {
    fn id(&self) -> ProviderId {
        ProviderId::System
    }

    async fn resolve(
        &self,
        unit: &NarrationUnit,
        config: &ProviderConfig,
    ) -> Result<PlayableAudio, VoiceError> {
        let voice = Some(config.voice.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(PlayableAudio::Utterance {
            text: unit.spoken_text(),
            voice,
        })
    }

    async fn list_voices(&self, _config: &ProviderConfig) -> Result<Vec<VoiceInfo>, VoiceError> {
        self.output.system_voices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PlaybackParams;
    use narrator_core::ClipPath;

    struct Silent;

    #[async_trait]
    impl AudioOutput for Silent {
        async fn play(&self, _: PlayableAudio, _: PlaybackParams) -> Result<(), VoiceError> {
            Ok(())
        }
        fn stop(&self) {}
    }

    #[tokio::test]
    async fn clips_become_their_fallback_phrase() {
        let provider = SystemVoiceProvider::new(Arc::new(Silent));
        let unit = NarrationUnit::clip(ClipPath::new("moves/queen-takes-f7-checkmate"), 350);
        let audio = provider
            .resolve(&unit, &ProviderConfig::defaults_for(ProviderId::System))
            .await
            .unwrap();
        assert_eq!(
            audio,
            PlayableAudio::Utterance {
                text: "queen takes f7 checkmate".to_string(),
                voice: None,
            }
        );
    }

    #[tokio::test]
    async fn outputs_without_an_engine_report_an_error() {
        let provider = SystemVoiceProvider::new(Arc::new(Silent));
        let result = provider
            .list_voices(&ProviderConfig::defaults_for(ProviderId::System))
            .await;
        assert!(matches!(result, Err(VoiceError::SystemVoice(_))));
    }
}
