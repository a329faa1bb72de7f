//! Playback sequencer.
//!
//! Plays one narration sequence at a time. Every call to
//! [`PlaybackSequencer::play`] starts a new generation and cuts off
//! whatever the previous generation was doing, whether it was still
//! resolving audio, playing a unit, or sitting in a pause. A superseded
//! run never plays another unit.
//!
//! All units of a sequence are resolved concurrently before the first one
//! plays, so the gaps between units are only the requested pauses. Units
//! that fail to resolve are skipped.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use narrator_core::{Generation, NarrationUnit, SettingsSource};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::audio::PlaybackParams;
use crate::gateway::ProviderGateway;
use crate::output::AudioOutput;

/// How a sequence run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every unit was played or skipped.
    Completed { played: usize, skipped: usize },
    /// A newer sequence started.
    Superseded,
    /// [`PlaybackSequencer::stop`] was called.
    Stopped,
}

#[derive(Debug, Clone, Copy, Default)]
struct PlaybackState {
    /// Latest generation handed out.
    generation: u64,
    /// Generations up to and including this one were stopped.
    halted_through: u64,
}

impl PlaybackState {
    /// `None` while `generation` may keep playing.
    const fn interruption(self, generation: u64) -> Option<PlaybackOutcome> {
        if self.generation != generation {
            Some(PlaybackOutcome::Superseded)
        } else if self.halted_through >= generation {
            Some(PlaybackOutcome::Stopped)
        } else {
            None
        }
    }
}

/// Pause after a unit, shortened or stretched by the playback speed.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_pause(pause_ms: u32, speed: f32) -> Duration {
    let micros = (f64::from(pause_ms) * 1000.0 / f64::from(speed)).round();
    Duration::from_micros(micros.max(0.0) as u64)
}

struct Inner {
    gateway: Arc<ProviderGateway>,
    output: Arc<dyn AudioOutput>,
    settings: Arc<dyn SettingsSource>,
    state: watch::Sender<PlaybackState>,
}

/// Cheap to clone; clones share one generation counter.
#[derive(Clone)]
pub struct PlaybackSequencer {
    inner: Arc<Inner>,
}

impl PlaybackSequencer {
    pub fn new(
        gateway: Arc<ProviderGateway>,
        output: Arc<dyn AudioOutput>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        let (state, _) = watch::channel(PlaybackState::default());
        Self {
            inner: Arc::new(Inner {
                gateway,
                output,
                settings,
                state,
            }),
        }
    }

    pub fn current_generation(&self) -> Generation {
        Generation(self.inner.state.borrow().generation)
    }

    /// Claim a new generation and silence the output.
    ///
    /// Any run of an older generation stops at its next checkpoint.
    pub fn begin(&self) -> Generation {
        let mut claimed = 0;
        self.inner.state.send_modify(|s| {
            s.generation += 1;
            claimed = s.generation;
        });
        self.inner.output.stop();
        Generation(claimed)
    }

    /// Start playing `units` in the background.
    ///
    /// The handle may be dropped; the run continues until it completes or
    /// is superseded.
    pub fn play(&self, units: Vec<NarrationUnit>) -> JoinHandle<PlaybackOutcome> {
        let generation = self.begin();
        let this = self.clone();
        tokio::spawn(async move { this.run(generation, units).await })
    }

    /// Play `units` to the end, returning how the run finished.
    pub async fn play_sequence(&self, units: Vec<NarrationUnit>) -> PlaybackOutcome {
        let generation = self.begin();
        self.run(generation, units).await
    }

    /// Halt the current sequence without starting a new one.
    pub fn stop(&self) {
        self.inner
            .state
            .send_modify(|s| s.halted_through = s.generation);
        self.inner.output.stop();
        debug!(generation = self.current_generation().0, "Playback stopped");
    }

    fn interruption(&self, generation: u64) -> Option<PlaybackOutcome> {
        self.inner.state.borrow().interruption(generation)
    }

    /// Resolves once `generation` is superseded or stopped.
    async fn interrupted(rx: &mut watch::Receiver<PlaybackState>, generation: u64) -> PlaybackOutcome {
        rx.wait_for(|s| s.interruption(generation).is_some())
            .await
            .ok()
            .and_then(|s| s.interruption(generation))
            .unwrap_or(PlaybackOutcome::Stopped)
    }

    async fn run(&self, generation: Generation, units: Vec<NarrationUnit>) -> PlaybackOutcome {
        let g = generation.0;
        let mut rx = self.inner.state.subscribe();

        let settings = self.inner.settings.snapshot();
        let provider = settings.provider;
        let config = settings.config_for(provider);
        let params = PlaybackParams {
            volume: settings.effective_volume(),
            speed: settings.effective_speed(),
        };
        debug!(generation = g, provider = %provider, units = units.len(), "Resolving sequence");

        let gateway = &self.inner.gateway;
        let resolving = join_all(units.iter().map(|unit| gateway.resolve(provider, unit, &config)));
        let resolved = tokio::select! {
            biased;
            outcome = Self::interrupted(&mut rx, g) => return outcome,
            resolved = resolving => resolved,
        };

        let last = units.len().saturating_sub(1);
        let (mut played, mut skipped) = (0, 0);

        for (index, (unit, audio)) in units.iter().zip(resolved).enumerate() {
            if let Some(outcome) = self.interruption(g) {
                return outcome;
            }
            let Some(audio) = audio else {
                skipped += 1;
                continue;
            };

            tokio::select! {
                biased;
                outcome = Self::interrupted(&mut rx, g) => return outcome,
                result = self.inner.output.play(audio, params) => match result {
                    Ok(()) => played += 1,
                    Err(e) => {
                        warn!(generation = g, unit = unit.label(), error = %e, "Playback failed");
                        skipped += 1;
                    }
                },
            }

            if let Some(outcome) = self.interruption(g) {
                return outcome;
            }
            if index < last && unit.pause_after_ms() > 0 {
                let pause = scaled_pause(unit.pause_after_ms(), params.speed);
                tokio::select! {
                    biased;
                    outcome = Self::interrupted(&mut rx, g) => return outcome,
                    () = tokio::time::sleep(pause) => {}
                }
            }
        }

        info!(generation = g, played, skipped, "Sequence finished");
        PlaybackOutcome::Completed { played, skipped }
    }
}
