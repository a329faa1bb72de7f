//! Speech provider identities and their per-provider configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::narration::UnitMode;
use super::server::LocalServer;

/// Base URL of the pre-recorded clip service.
pub const DEFAULT_CLOUD_BASE_URL: &str = "https://enparlant.redshed.ai/audio";

/// Default KittenTTS server address (the bundled script listens on 8192).
pub const DEFAULT_KITTENTTS_URL: &str = "http://127.0.0.1:8192";

/// Default OpenTTS container address.
pub const DEFAULT_OPENTTS_URL: &str = "http://127.0.0.1:5500";

/// Selectable speech backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Pre-recorded clips served over HTTP.
    Cloud,
    /// ElevenLabs synthesis API.
    #[serde(rename = "elevenlabs")]
    ElevenLabs,
    /// Google Cloud Text-to-Speech.
    Google,
    /// The operating system's speech engine.
    System,
    /// Self-hosted KittenTTS Python server.
    #[serde(rename = "kittentts")]
    KittenTts,
    /// Self-hosted OpenTTS container.
    #[serde(rename = "opentts")]
    OpenTts,
}

impl ProviderId {
    pub const ALL: [Self; 6] = [
        Self::Cloud,
        Self::ElevenLabs,
        Self::Google,
        Self::System,
        Self::KittenTts,
        Self::OpenTts,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::ElevenLabs => "elevenlabs",
            Self::Google => "google",
            Self::System => "system",
            Self::KittenTts => "kittentts",
            Self::OpenTts => "opentts",
        }
    }

    /// Whether narration for this provider is built from clips or text.
    pub const fn unit_mode(self) -> UnitMode {
        match self {
            Self::Cloud => UnitMode::Clip,
            _ => UnitMode::Text,
        }
    }

    /// The self-hosted server backing this provider, if any.
    pub const fn local_server(self) -> Option<LocalServer> {
        match self {
            Self::KittenTts => Some(LocalServer::KittenTts),
            Self::OpenTts => Some(LocalServer::OpenTts),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown speech provider '{0}' (expected one of: cloud, elevenlabs, google, system, kittentts, opentts)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Per-provider settings, owned by the settings layer.
///
/// The narration engine only ever reads a snapshot of this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for commercial providers.
    pub api_key: Option<String>,
    /// Endpoint override (clip service root or local server URL).
    pub base_url: Option<String>,
    /// Voice identifier in the provider's own namespace.
    pub voice: String,
    /// Language code, e.g. `en` or `en-US`.
    pub language: String,
    /// CPU threads for local inference (KittenTTS only, 0/None = auto).
    pub threads: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            voice: String::new(),
            language: "en".to_string(),
            threads: None,
        }
    }
}

impl ProviderConfig {
    /// Factory defaults for a provider.
    pub fn defaults_for(id: ProviderId) -> Self {
        let (voice, language, base_url) = match id {
            ProviderId::Cloud => ("daniel", "en", Some(DEFAULT_CLOUD_BASE_URL)),
            ProviderId::ElevenLabs => ("21m00Tcm4TlvDq8ikWAM", "en", None),
            ProviderId::Google => ("en-US-Neural2-D", "en-US", None),
            ProviderId::System => ("", "en", None),
            ProviderId::KittenTts => ("expr-voice-2-m", "en", Some(DEFAULT_KITTENTTS_URL)),
            ProviderId::OpenTts => ("espeak:en", "en", Some(DEFAULT_OPENTTS_URL)),
        };
        Self {
            voice: voice.to_string(),
            language: language.to_string(),
            base_url: base_url.map(str::to_string),
            ..Self::default()
        }
    }

    /// Configured base URL, or the provider's default, without a trailing slash.
    pub fn effective_base_url(&self, id: ProviderId) -> Option<String> {
        self.base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| Self::defaults_for(id).base_url)
            .map(|url| url.trim_end_matches('/').to_string())
    }

    /// API key, treating blank strings as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_case_insensitively() {
        assert_eq!("ElevenLabs".parse::<ProviderId>(), Ok(ProviderId::ElevenLabs));
        assert_eq!(" opentts ".parse::<ProviderId>(), Ok(ProviderId::OpenTts));
        assert!("festival".parse::<ProviderId>().is_err());
    }

    #[test]
    fn serde_uses_wire_ids() {
        let json = serde_json::to_string(&ProviderId::KittenTts).unwrap();
        assert_eq!(json, "\"kittentts\"");
        let back: ProviderId = serde_json::from_str("\"elevenlabs\"").unwrap();
        assert_eq!(back, ProviderId::ElevenLabs);
    }

    #[test]
    fn only_cloud_uses_clip_mode() {
        for id in ProviderId::ALL {
            let expected = if id == ProviderId::Cloud { UnitMode::Clip } else { UnitMode::Text };
            assert_eq!(id.unit_mode(), expected, "{id}");
        }
    }

    #[test]
    fn effective_base_url_falls_back_and_trims() {
        let mut config = ProviderConfig::defaults_for(ProviderId::KittenTts);
        config.base_url = Some("http://localhost:9000/".to_string());
        assert_eq!(
            config.effective_base_url(ProviderId::KittenTts).as_deref(),
            Some("http://localhost:9000")
        );

        config.base_url = Some("  ".to_string());
        assert_eq!(
            config.effective_base_url(ProviderId::KittenTts).as_deref(),
            Some(DEFAULT_KITTENTTS_URL)
        );
        assert_eq!(ProviderConfig::default().effective_base_url(ProviderId::Google), None);
    }

    #[test]
    fn blank_api_key_is_absent() {
        let config = ProviderConfig {
            api_key: Some("   ".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(config.api_key(), None);
    }
}
