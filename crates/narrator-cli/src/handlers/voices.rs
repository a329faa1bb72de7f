//! `voices`: list what a provider can speak with.

use anyhow::Result;
use narrator_core::{ProviderId, SettingsSource};
use narrator_voice::{VoiceGender, VoiceInfo};

use super::narrate::ensure_server;
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the voices command.
pub async fn execute(ctx: &CliContext, provider: Option<ProviderId>) -> Result<()> {
    let settings = ctx.settings.snapshot();
    let provider = provider.unwrap_or(settings.provider);
    let current = settings.config_for(provider).voice;

    ensure_server(ctx, provider).await?;
    let session = ctx.session()?;
    let mut voices = session
        .list_voices_for(provider)
        .await
        .map_err(CliError::from)?;
    voices.sort_by(|a, b| a.id.cmp(&b.id));
    if voices.is_empty() {
        println!("{provider} offers no voices");
        return Ok(());
    }

    println!("{:<2}{:<28} {:<32} {:<10} GENDER", "", "ID", "NAME", "LANGUAGE");
    for voice in &voices {
        println!("{}", format_voice(voice, voice.id == current));
    }
    Ok(())
}

/// One table row; the configured voice is starred.
pub fn format_voice(voice: &VoiceInfo, selected: bool) -> String {
    let gender = match voice.gender {
        Some(VoiceGender::Female) => "female",
        Some(VoiceGender::Male) => "male",
        None => "-",
    };
    format!(
        "{:<2}{:<28} {:<32} {:<10} {}",
        if selected { "*" } else { "" },
        voice.id,
        voice.name,
        voice.language,
        gender
    )
}
