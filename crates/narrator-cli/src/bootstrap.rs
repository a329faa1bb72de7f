//! CLI bootstrap: the composition root.
//!
//! Settings are layered in this order, later layers winning:
//! 1. the settings file (`--settings`, else `<config dir>/narrator/settings.json`)
//! 2. environment variables (a `.env` file is loaded by the binary first)
//! 3. command-line flags
//!
//! [`bootstrap`] then wires the process supervisor, the lifecycle manager
//! and the narration context. The audio device is only opened when a
//! command actually plays something.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use narrator_core::{
    LifecycleManager, LocalServer, ProviderId, ServerReadiness, Settings, SettingsSource,
    SharedSettings, StartOptions, validate_settings,
};
use narrator_runtime::ProcessSupervisor;
use narrator_voice::{LocalAudioOutput, NarrationContext, NarrationSession};
use tracing::debug;

use crate::error::CliError;

/// Environment variable selecting the active provider.
pub const ENV_PROVIDER: &str = "NARRATOR_PROVIDER";
pub const ENV_ELEVENLABS_KEY: &str = "ELEVENLABS_API_KEY";
pub const ENV_GOOGLE_KEY: &str = "GOOGLE_TTS_API_KEY";
pub const ENV_KITTENTTS_URL: &str = "KITTENTTS_URL";
pub const ENV_OPENTTS_URL: &str = "OPENTTS_URL";

/// Default settings file location.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("narrator").join("settings.json"))
}

/// Load settings from a file.
///
/// An explicit path must exist. A missing default file just means factory
/// defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    let explicit = path.is_some();
    let Some(path) = path.map(Path::to_path_buf).or_else(default_settings_path) else {
        return Ok(Settings::default());
    };

    match fs::read_to_string(&path) {
        Ok(json) => {
            debug!(path = %path.display(), "Loaded settings file");
            Ok(Settings::from_json(&json)?)
        }
        Err(e) if !explicit && e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No settings file, using defaults");
            Ok(Settings::default())
        }
        Err(e) => Err(CliError::Io(format!("{}: {e}", path.display()))),
    }
}

/// Apply environment overrides. Blank values are ignored.
pub fn apply_env_overrides(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), CliError> {
    let lookup = |name: &str| var(name).filter(|value| !value.trim().is_empty());

    if let Some(provider) = lookup(ENV_PROVIDER) {
        settings.provider = provider.parse()?;
    }
    if let Some(key) = lookup(ENV_ELEVENLABS_KEY) {
        settings.provider_mut(ProviderId::ElevenLabs).api_key = Some(key);
    }
    if let Some(key) = lookup(ENV_GOOGLE_KEY) {
        settings.provider_mut(ProviderId::Google).api_key = Some(key);
    }
    if let Some(url) = lookup(ENV_KITTENTTS_URL) {
        settings.provider_mut(ProviderId::KittenTts).base_url = Some(url);
    }
    if let Some(url) = lookup(ENV_OPENTTS_URL) {
        settings.provider_mut(ProviderId::OpenTts).base_url = Some(url);
    }
    Ok(())
}

/// Build the validated settings snapshot for this invocation.
pub fn resolve_settings(
    path: Option<&Path>,
    provider: Option<ProviderId>,
) -> Result<Settings, CliError> {
    let mut settings = load_settings(path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
    if let Some(provider) = provider {
        settings.provider = provider;
    }
    validate_settings(&settings)?;
    debug!(provider = %settings.provider, "Settings resolved");
    Ok(settings)
}

/// Everything the command handlers need.
pub struct CliContext {
    pub settings: SharedSettings,
    pub lifecycle: Arc<LifecycleManager>,
    narration: NarrationContext,
}

impl CliContext {
    /// Open the audio device and build a narration session on it.
    pub fn session(&self) -> Result<NarrationSession, CliError> {
        let output = Arc::new(LocalAudioOutput::open()?);
        Ok(NarrationSession::new(
            &self.narration,
            output,
            Arc::new(self.settings.clone()),
        ))
    }

    /// Start options for a server, from its provider settings.
    pub fn start_options(&self, server: LocalServer) -> StartOptions {
        let threads = self
            .settings
            .snapshot()
            .config_for(server.provider_id())
            .threads;
        StartOptions {
            threads,
            ..StartOptions::default()
        }
    }
}

/// Wire the CLI context.
pub fn bootstrap(settings: Settings) -> Result<CliContext, CliError> {
    let lifecycle = Arc::new(LifecycleManager::new(Arc::new(ProcessSupervisor::default())));
    let readiness: Arc<dyn ServerReadiness> = lifecycle.clone();
    let narration = NarrationContext::new(readiness)?;

    Ok(CliContext {
        settings: SharedSettings::new(settings),
        lifecycle,
        narration,
    })
}
