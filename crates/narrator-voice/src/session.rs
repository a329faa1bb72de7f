//! Narration session: the engine's front door.
//!
//! Ties the translator, provider gateway, sequencer, cache and settings
//! together. Callers hand it game events and it decides what to say.

use std::sync::Arc;

use narrator_core::{
    NarrationEvent, NarrationUnit, ProviderId, SettingsSource, build_units, demo_units,
};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::AudioCache;
use crate::context::NarrationContext;
use crate::error::VoiceError;
use crate::gateway::ProviderGateway;
use crate::output::AudioOutput;
use crate::providers::VoiceInfo;
use crate::sequencer::{PlaybackOutcome, PlaybackSequencer};

pub struct NarrationSession {
    gateway: Arc<ProviderGateway>,
    sequencer: PlaybackSequencer,
    cache: Arc<AudioCache>,
    settings: Arc<dyn SettingsSource>,
}

impl NarrationSession {
    /// Session with every built-in provider.
    pub fn new(
        ctx: &NarrationContext,
        output: Arc<dyn AudioOutput>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        let gateway = ProviderGateway::with_defaults(ctx, Arc::clone(&output));
        Self::with_gateway(gateway, Arc::clone(&ctx.cache), output, settings)
    }

    /// Session over a caller-built gateway.
    pub fn with_gateway(
        gateway: ProviderGateway,
        cache: Arc<AudioCache>,
        output: Arc<dyn AudioOutput>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        cache.attach_output(Arc::clone(&output));
        let gateway = Arc::new(gateway);
        let sequencer =
            PlaybackSequencer::new(Arc::clone(&gateway), output, Arc::clone(&settings));
        Self {
            gateway,
            sequencer,
            cache,
            settings,
        }
    }

    pub const fn sequencer(&self) -> &PlaybackSequencer {
        &self.sequencer
    }

    pub fn cache(&self) -> &Arc<AudioCache> {
        &self.cache
    }

    /// Units the active provider would speak for an event.
    pub fn units_for(&self, event: &NarrationEvent) -> Vec<NarrationUnit> {
        let mode = self.settings.snapshot().provider.unit_mode();
        build_units(event, mode)
    }

    /// Narrate a move, interrupting anything still playing.
    pub fn narrate(&self, event: &NarrationEvent) -> JoinHandle<PlaybackOutcome> {
        let units = self.units_for(event);
        debug!(san = event.san.as_deref().unwrap_or(""), units = units.len(), "Narrating");
        self.sequencer.play(units)
    }

    /// Speak arbitrary text with the active provider.
    pub fn speak_text(&self, text: &str) -> JoinHandle<PlaybackOutcome> {
        let text = text.trim();
        let units = if text.is_empty() {
            Vec::new()
        } else {
            vec![NarrationUnit::text(text, 0)]
        };
        self.sequencer.play(units)
    }

    /// Play the fixed test sequence.
    pub fn play_demo(&self) -> JoinHandle<PlaybackOutcome> {
        let mode = self.settings.snapshot().provider.unit_mode();
        self.sequencer.play(demo_units(mode))
    }

    pub fn stop(&self) {
        self.sequencer.stop();
    }

    /// Release cached audio. Silences the output first.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Voices of the active provider.
    pub async fn list_voices(&self) -> Result<Vec<VoiceInfo>, VoiceError> {
        let provider = self.settings.snapshot().provider;
        self.list_voices_for(provider).await
    }

    pub async fn list_voices_for(&self, provider: ProviderId) -> Result<Vec<VoiceInfo>, VoiceError> {
        let config = self.settings.snapshot().config_for(provider);
        self.gateway.list_voices(provider, &config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use narrator_core::{ProviderConfig, Settings, SharedSettings, UnitContent};

    use crate::audio::{PlayableAudio, PlaybackParams};
    use crate::providers::SpeechProvider;

    /// Speaks every unit as its spoken text.
    struct Echo;

    #[async_trait]
    impl SpeechProvider for Echo {
        fn id(&self) -> ProviderId {
            ProviderId::System
        }

        async fn resolve(
            &self,
            unit: &NarrationUnit,
            _config: &ProviderConfig,
        ) -> Result<PlayableAudio, VoiceError> {
            Ok(PlayableAudio::Utterance {
                text: unit.spoken_text(),
                voice: None,
            })
        }

        async fn list_voices(&self, _config: &ProviderConfig) -> Result<Vec<VoiceInfo>, VoiceError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Recorder {
        spoken: Mutex<Vec<String>>,
        stops: AtomicUsize,
    }

    #[async_trait]
    impl AudioOutput for Recorder {
        async fn play(&self, audio: PlayableAudio, _params: PlaybackParams) -> Result<(), VoiceError> {
            if let PlayableAudio::Utterance { text, .. } = audio {
                self.spoken.lock().unwrap().push(text);
            }
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session(settings: &SharedSettings) -> (NarrationSession, Arc<Recorder>) {
        let mut gateway = ProviderGateway::new();
        gateway.register(Arc::new(Echo));
        let output = Arc::new(Recorder::default());
        let session = NarrationSession::with_gateway(
            gateway,
            Arc::new(AudioCache::new()),
            output.clone(),
            Arc::new(settings.clone()),
        );
        (session, output)
    }

    fn system_settings() -> SharedSettings {
        SharedSettings::new(Settings {
            provider: ProviderId::System,
            ..Settings::default()
        })
    }

    #[test]
    fn units_follow_the_active_provider() {
        let settings = SharedSettings::new(Settings::default());
        let (session, _) = session(&settings);
        let event = NarrationEvent::for_move("Nf3", 0);

        let clips = session.units_for(&event);
        assert!(matches!(clips[0].content(), UnitContent::Clip { path } if path.as_str() == "moves/knight-f3"));

        settings.update(|s| s.provider = ProviderId::System);
        let spoken = session.units_for(&event);
        assert!(matches!(spoken[0].content(), UnitContent::Text { text } if text == "Knight f3"));
    }

    #[tokio::test(start_paused = true)]
    async fn narrate_speaks_move_then_annotation() {
        let settings = system_settings();
        let (session, output) = session(&settings);

        let event = NarrationEvent::for_move("Nf3", 0).with_annotation("!");
        let outcome = session.narrate(&event).await.unwrap();

        assert_eq!(outcome, PlaybackOutcome::Completed { played: 2, skipped: 0 });
        assert_eq!(*output.spoken.lock().unwrap(), ["Knight f3", "Good move"]);
    }

    #[tokio::test]
    async fn blank_text_completes_without_audio() {
        let settings = system_settings();
        let (session, output) = session(&settings);

        let outcome = session.speak_text("   ").await.unwrap();
        assert_eq!(outcome, PlaybackOutcome::Completed { played: 0, skipped: 0 });
        assert!(output.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_cache_silences_output() {
        let settings = system_settings();
        let (session, output) = session(&settings);

        session.clear_cache();
        assert_eq!(output.stops.load(Ordering::SeqCst), 1);
    }
}
