//! `say`, `speak` and `demo`: play narration through the active provider.

use anyhow::Result;
use narrator_core::{NarrationEvent, ProviderId, SettingsSource};
use narrator_voice::{NarrationSession, PlaybackOutcome};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Narrate a move.
pub async fn say(ctx: &CliContext, event: NarrationEvent) -> Result<()> {
    run(ctx, |session| session.narrate(&event)).await
}

/// Speak free text.
pub async fn speak(ctx: &CliContext, text: &str) -> Result<()> {
    run(ctx, |session| session.speak_text(text)).await
}

/// Play the test sequence.
pub async fn demo(ctx: &CliContext) -> Result<()> {
    run(ctx, NarrationSession::play_demo).await
}

/// Start the provider's self-hosted server if it needs one.
///
/// A KittenTTS process launched here lives as long as this command. Servers
/// that were already answering, and the OpenTTS container, are left running.
pub async fn ensure_server(ctx: &CliContext, provider: ProviderId) -> Result<()> {
    let Some(server) = provider.local_server() else {
        return Ok(());
    };

    debug!(server = %server, "Provider needs a local server");
    let started = ctx
        .lifecycle
        .ensure_running(server, &ctx.start_options(server))
        .await
        .map_err(CliError::from)?;
    if started {
        info!(server = %server, "Local server is up");
    }
    Ok(())
}

async fn run(
    ctx: &CliContext,
    play: impl FnOnce(&NarrationSession) -> JoinHandle<PlaybackOutcome>,
) -> Result<()> {
    let provider = ctx.settings.snapshot().provider;
    ensure_server(ctx, provider).await?;

    let outcome = play_to_end(ctx, play).await?;
    info!(provider = %provider, ?outcome, "Narration finished");
    if let Some(notice) = unplayed_notice(outcome) {
        warn!(provider = %provider, "{notice}");
    }
    if matches!(
        outcome,
        PlaybackOutcome::Stopped | PlaybackOutcome::Superseded
    ) {
        println!("Stopped.");
    }
    Ok(())
}

async fn play_to_end(
    ctx: &CliContext,
    play: impl FnOnce(&NarrationSession) -> JoinHandle<PlaybackOutcome>,
) -> Result<PlaybackOutcome> {
    let session = ctx.session()?;
    let mut handle = play(&session);

    let outcome = tokio::select! {
        joined = &mut handle => joined?,
        _ = tokio::signal::ctrl_c() => {
            session.stop();
            handle.await?
        }
    };
    Ok(outcome)
}

/// Describe the units a finished sequence could not play, if any.
///
/// Unplayable units are never a command failure; a sequence where every unit
/// failed stays silent and still exits successfully.
pub fn unplayed_notice(outcome: PlaybackOutcome) -> Option<String> {
    match outcome {
        PlaybackOutcome::Completed { played: 0, skipped } if skipped > 0 => Some(format!(
            "Nothing could be played ({skipped} units skipped, run with -v for details)"
        )),
        PlaybackOutcome::Completed { skipped, .. } if skipped > 0 => {
            Some(format!("{skipped} units could not be played"))
        }
        _ => None,
    }
}
