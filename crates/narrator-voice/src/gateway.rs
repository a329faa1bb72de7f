//! Provider gateway: dispatch by [`ProviderId`].

use std::collections::BTreeMap;
use std::sync::Arc;

use narrator_core::{LocalServer, NarrationUnit, ProviderConfig, ProviderId};
use tracing::{debug, warn};

use crate::audio::PlayableAudio;
use crate::context::NarrationContext;
use crate::error::VoiceError;
use crate::output::AudioOutput;
use crate::providers::{
    CloudClipProvider, ElevenLabsProvider, GoogleProvider, SelfHostedProvider, SpeechProvider,
    SystemVoiceProvider, VoiceInfo,
};

/// One provider per id.
#[derive(Default, Clone)]
pub struct ProviderGateway {
    providers: BTreeMap<ProviderId, Arc<dyn SpeechProvider>>,
}

impl ProviderGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in provider, sharing the context's client and cache.
    pub fn with_defaults(ctx: &NarrationContext, output: Arc<dyn AudioOutput>) -> Self {
        let mut gateway = Self::new();
        gateway.register(Arc::new(CloudClipProvider::new(
            ctx.http.clone(),
            Arc::clone(&ctx.cache),
        )));
        gateway.register(Arc::new(ElevenLabsProvider::new(
            ctx.http.clone(),
            Arc::clone(&ctx.cache),
        )));
        gateway.register(Arc::new(GoogleProvider::new(
            ctx.http.clone(),
            Arc::clone(&ctx.cache),
        )));
        gateway.register(Arc::new(SystemVoiceProvider::new(output)));
        for server in LocalServer::ALL {
            gateway.register(Arc::new(SelfHostedProvider::new(
                server,
                ctx.http.clone(),
                Arc::clone(&ctx.cache),
                Arc::clone(&ctx.readiness),
            )));
        }
        gateway
    }

    /// Register a provider, replacing any previous one with the same id.
    pub fn register(&mut self, provider: Arc<dyn SpeechProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn provider(&self, id: ProviderId) -> Result<&Arc<dyn SpeechProvider>, VoiceError> {
        self.providers.get(&id).ok_or(VoiceError::NoProvider(id))
    }

    /// Resolve a unit, surfacing the provider's error.
    pub async fn try_resolve(
        &self,
        id: ProviderId,
        unit: &NarrationUnit,
        config: &ProviderConfig,
    ) -> Result<PlayableAudio, VoiceError> {
        self.provider(id)?.resolve(unit, config).await
    }

    /// Resolve a unit; any failure is logged and yields `None`.
    pub async fn resolve(
        &self,
        id: ProviderId,
        unit: &NarrationUnit,
        config: &ProviderConfig,
    ) -> Option<PlayableAudio> {
        match self.try_resolve(id, unit, config).await {
            Ok(audio) => Some(audio),
            Err(e) if e.is_not_ready() => {
                debug!(provider = %id, unit = unit.label(), error = %e, "Unit skipped");
                None
            }
            Err(e) => {
                warn!(provider = %id, unit = unit.label(), error = %e, "Failed to resolve unit");
                None
            }
        }
    }

    pub async fn list_voices(
        &self,
        id: ProviderId,
        config: &ProviderConfig,
    ) -> Result<Vec<VoiceInfo>, VoiceError> {
        self.provider(id)?.list_voices(config).await
    }
}
