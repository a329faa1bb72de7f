//! HTTP helpers shared by the network providers.

use narrator_core::{ProviderConfig, ProviderId};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::audio::{AudioClip, AudioFormat};
use crate::error::VoiceError;

async fn send_ok(provider: ProviderId, request: RequestBuilder) -> Result<reqwest::Response, VoiceError> {
    let response = request.send().await.map_err(|e| VoiceError::network(&e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(VoiceError::HttpStatus {
            provider,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// Send a request whose body is encoded audio.
pub(crate) async fn fetch_audio(
    provider: ProviderId,
    request: RequestBuilder,
    format: AudioFormat,
) -> Result<AudioClip, VoiceError> {
    let response = send_ok(provider, request).await?;
    let bytes = response.bytes().await.map_err(|e| VoiceError::network(&e))?;
    if bytes.is_empty() {
        return Err(VoiceError::InvalidResponse {
            provider,
            reason: "empty audio body".to_string(),
        });
    }
    Ok(AudioClip::new(bytes.to_vec(), format))
}

/// Send a request whose body is JSON.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<T, VoiceError> {
    let response = send_ok(provider, request).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| VoiceError::InvalidResponse {
            provider,
            reason: e.to_string(),
        })
}

/// Configured endpoint root, or `default`, without a trailing slash.
pub(crate) fn api_base(config: &ProviderConfig, default: &str) -> String {
    config
        .base_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}
