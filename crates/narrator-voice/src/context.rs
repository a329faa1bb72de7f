//! Shared infrastructure handed to every provider.

use std::sync::Arc;
use std::time::Duration;

use narrator_core::ServerReadiness;
use reqwest::Client;

use crate::cache::AudioCache;
use crate::error::VoiceError;

/// Timeout applied to every provider request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client, audio cache and server readiness for one session.
#[derive(Clone)]
pub struct NarrationContext {
    pub http: Client,
    pub cache: Arc<AudioCache>,
    pub readiness: Arc<dyn ServerReadiness>,
}

impl NarrationContext {
    /// Build a context with a fresh cache and the default HTTP client.
    pub fn new(readiness: Arc<dyn ServerReadiness>) -> Result<Self, VoiceError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| VoiceError::network(&e))?;
        Ok(Self::with_client(http, readiness))
    }

    pub fn with_client(http: Client, readiness: Arc<dyn ServerReadiness>) -> Self {
        Self {
            http,
            cache: Arc::new(AudioCache::new()),
            readiness,
        }
    }
}
