//! Narration settings and validation.
//!
//! The narration engine never mutates settings; it reads a snapshot through
//! [`SettingsSource`](crate::ports::SettingsSource) at the start of each
//! resolve/play call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ProviderConfig, ProviderId};

/// Slowest supported speed multiplier.
pub const MIN_SPEED: f32 = 0.5;

/// Fastest supported speed multiplier.
pub const MAX_SPEED: f32 = 2.0;

/// Upper bound for local inference threads.
pub const MAX_THREADS: u32 = 64;

/// Narration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Active speech provider.
    pub provider: ProviderId,

    /// Output volume, 0.0 to 1.0.
    pub volume: f32,

    /// Playback speed multiplier, 0.5 to 2.0. Also divides inter-unit pauses.
    pub speed: f32,

    /// Per-provider overrides. Missing providers use factory defaults.
    pub providers: BTreeMap<ProviderId, ProviderConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Settings with factory defaults: cloud clips at full volume, normal speed.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            provider: ProviderId::Cloud,
            volume: 1.0,
            speed: 1.0,
            providers: BTreeMap::new(),
        }
    }

    /// Parse settings from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Effective configuration for a provider.
    ///
    /// Stored values win; blank voice/language and a missing base URL fall
    /// back to the provider's factory defaults.
    pub fn config_for(&self, id: ProviderId) -> ProviderConfig {
        let defaults = ProviderConfig::defaults_for(id);
        let Some(stored) = self.providers.get(&id) else {
            return defaults;
        };

        let mut config = stored.clone();
        if config.voice.trim().is_empty() {
            config.voice = defaults.voice;
        }
        if config.language.trim().is_empty() {
            config.language = defaults.language;
        }
        if config.base_url.is_none() {
            config.base_url = defaults.base_url;
        }
        config
    }

    /// Mutable access to a provider's stored configuration, seeding it with
    /// factory defaults on first use.
    pub fn provider_mut(&mut self, id: ProviderId) -> &mut ProviderConfig {
        self.providers
            .entry(id)
            .or_insert_with(|| ProviderConfig::defaults_for(id))
    }

    /// Speed clamped to the supported range.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        if self.speed.is_finite() {
            self.speed.clamp(MIN_SPEED, MAX_SPEED)
        } else {
            1.0
        }
    }

    /// Volume clamped to 0.0..=1.0.
    #[must_use]
    pub fn effective_volume(&self) -> f32 {
        if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Volume must be between 0.0 and 1.0, got {0}")]
    InvalidVolume(f32),

    #[error("Speed must be between 0.5 and 2.0, got {0}")]
    InvalidSpeed(f32),

    #[error("Thread count must be between 1 and 64, got {0}")]
    InvalidThreads(u32),

    #[error("Base URL for {0} must start with http:// or https://")]
    InvalidBaseUrl(ProviderId),

    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if !(0.0..=1.0).contains(&settings.volume) {
        return Err(SettingsError::InvalidVolume(settings.volume));
    }

    if !(MIN_SPEED..=MAX_SPEED).contains(&settings.speed) {
        return Err(SettingsError::InvalidSpeed(settings.speed));
    }

    for (id, config) in &settings.providers {
        if let Some(threads) = config.threads {
            if !(1..=MAX_THREADS).contains(&threads) {
                return Err(SettingsError::InvalidThreads(threads));
            }
        }

        if config
            .base_url
            .as_deref()
            .map(str::trim)
            .is_some_and(|url| {
                !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://")
            })
        {
            return Err(SettingsError::InvalidBaseUrl(*id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.provider, ProviderId::Cloud);
        assert!((settings.volume - 1.0).abs() < f32::EPSILON);
        assert!((settings.speed - 1.0).abs() < f32::EPSILON);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_validate_speed_out_of_range() {
        let settings = Settings {
            speed: 3.0,
            ..Settings::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidSpeed(3.0))
        );
    }

    #[test]
    fn test_validate_volume_out_of_range() {
        let settings = Settings {
            volume: -0.1,
            ..Settings::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidVolume(_))
        ));
    }

    #[test]
    fn test_validate_threads() {
        let mut settings = Settings::default();
        settings.provider_mut(ProviderId::KittenTts).threads = Some(0);
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidThreads(0))
        );
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let mut settings = Settings::default();
        settings.provider_mut(ProviderId::OpenTts).base_url = Some("localhost:5500".to_string());
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidBaseUrl(ProviderId::OpenTts))
        );
    }

    #[test]
    fn test_from_json_partial() {
        let settings = Settings::from_json(
            r#"{"provider":"elevenlabs","speed":1.5,"providers":{"elevenlabs":{"apiKey":"k"}}}"#,
        )
        .unwrap();
        assert_eq!(settings.provider, ProviderId::ElevenLabs);
        assert!((settings.volume - 1.0).abs() < f32::EPSILON);

        let config = settings.config_for(ProviderId::ElevenLabs);
        assert_eq!(config.api_key(), Some("k"));
        assert_eq!(config.voice, "21m00Tcm4TlvDq8ikWAM");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_config_for_unknown_uses_defaults() {
        let settings = Settings::default();
        let config = settings.config_for(ProviderId::Cloud);
        assert_eq!(config.voice, "daniel");
        assert_eq!(config.language, "en");
    }

    #[test]
    fn test_effective_speed_clamps() {
        let settings = Settings {
            speed: 9.0,
            ..Settings::default()
        };
        assert!((settings.effective_speed() - MAX_SPEED).abs() < f32::EPSILON);
        let settings = Settings {
            speed: f32::NAN,
            ..Settings::default()
        };
        assert!((settings.effective_speed() - 1.0).abs() < f32::EPSILON);
    }
}
