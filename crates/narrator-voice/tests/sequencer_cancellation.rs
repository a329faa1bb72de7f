//! Sequencer timing and cancellation, on tokio's paused clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use narrator_core::{NarrationUnit, ProviderConfig, ProviderId, Settings};
use narrator_voice::{
    AudioOutput, PlayableAudio, PlaybackOutcome, PlaybackParams, PlaybackSequencer,
    ProviderGateway, SpeechProvider, VoiceError, VoiceInfo,
};
use tokio::time::Instant;

// ── Fakes ──────────────────────────────────────────────────────────

/// Output that "plays" each utterance for a fixed time and records when it
/// started.
struct RecordingOutput {
    origin: Instant,
    clip_len: Duration,
    played: Mutex<Vec<(String, Duration)>>,
    stops: AtomicUsize,
    undecodable: Option<&'static str>,
}

impl RecordingOutput {
    fn new(clip_len: Duration) -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            clip_len,
            played: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            undecodable: None,
        })
    }

    /// Like [`new`](Self::new), but `label` fails to decode.
    fn rejecting(clip_len: Duration, label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            clip_len,
            played: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            undecodable: Some(label),
        })
    }

    fn labels(&self) -> Vec<String> {
        self.played
            .lock()
            .unwrap()
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    fn start_times(&self) -> Vec<Duration> {
        self.played.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl AudioOutput for RecordingOutput {
    async fn play(&self, audio: PlayableAudio, _params: PlaybackParams) -> Result<(), VoiceError> {
        let label = match audio {
            PlayableAudio::Utterance { text, .. } => text,
            PlayableAudio::Clip(clip) => format!("{} bytes", clip.len()),
        };
        if self.undecodable == Some(label.as_str()) {
            return Err(VoiceError::Decode(format!("cannot decode {label}")));
        }
        self.played
            .lock()
            .unwrap()
            .push((label, self.origin.elapsed()));
        tokio::time::sleep(self.clip_len).await;
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider that takes a configurable time per text and fails on request.
#[derive(Default)]
struct ScriptedProvider {
    delays: HashMap<&'static str, Duration>,
    failing: Vec<&'static str>,
}

impl ScriptedProvider {
    fn delay(mut self, text: &'static str, delay: Duration) -> Self {
        self.delays.insert(text, delay);
        self
    }

    fn fail(mut self, text: &'static str) -> Self {
        self.failing.push(text);
        self
    }
}

#[async_trait]
impl SpeechProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::System
    }

    async fn resolve(
        &self,
        unit: &NarrationUnit,
        _config: &ProviderConfig,
    ) -> Result<PlayableAudio, VoiceError> {
        let text = unit.spoken_text();
        if let Some(delay) = self.delays.get(text.as_str()) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&text.as_str()) {
            return Err(VoiceError::Unavailable(text));
        }
        Ok(PlayableAudio::Utterance { text, voice: None })
    }

    async fn list_voices(&self, _config: &ProviderConfig) -> Result<Vec<VoiceInfo>, VoiceError> {
        Ok(Vec::new())
    }
}

/// Output whose `play` only runs after a `stop` has already landed: the
/// interleaving a multi-threaded runtime allows between the sequencer's
/// interruption check and its call into the output. The audio it starts
/// keeps sounding until its future is dropped.
#[derive(Default)]
struct LateStartOutput {
    sequencer: OnceLock<PlaybackSequencer>,
    sounding: Arc<Mutex<Option<String>>>,
}

/// Silences the audio started by the `play` future that owns it.
struct Sounding(Arc<Mutex<Option<String>>>);

impl Drop for Sounding {
    fn drop(&mut self) {
        *self.0.lock().unwrap() = None;
    }
}

#[async_trait]
impl AudioOutput for LateStartOutput {
    async fn play(&self, audio: PlayableAudio, _params: PlaybackParams) -> Result<(), VoiceError> {
        if let Some(seq) = self.sequencer.get() {
            seq.stop();
        }
        let PlayableAudio::Utterance { text, .. } = audio else {
            return Ok(());
        };
        *self.sounding.lock().unwrap() = Some(text);
        let _sounding = Sounding(Arc::clone(&self.sounding));
        std::future::pending::<()>().await;
        Ok(())
    }

    fn stop(&self) {
        *self.sounding.lock().unwrap() = None;
    }
}

fn sequencer<O: AudioOutput + 'static>(
    provider: ScriptedProvider,
    output: Arc<O>,
    speed: f32,
) -> PlaybackSequencer {
    let mut gateway = ProviderGateway::new();
    gateway.register(Arc::new(provider));
    let settings = Settings {
        provider: ProviderId::System,
        speed,
        ..Settings::default()
    };
    PlaybackSequencer::new(Arc::new(gateway), output, Arc::new(settings))
}

fn units(texts: &[&str], pause_ms: u32) -> Vec<NarrationUnit> {
    texts.iter().map(|t| NarrationUnit::text(*t, pause_ms)).collect()
}

const CLIP: Duration = Duration::from_millis(100);

// ── Ordering and timing ────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn plays_in_order_with_pauses_scaled_by_speed() {
    let output = RecordingOutput::new(CLIP);
    let seq = sequencer(ScriptedProvider::default(), Arc::clone(&output), 2.0);
    let started = Instant::now();

    let outcome = seq.play_sequence(units(&["a", "b", "c"], 300)).await;

    assert_eq!(outcome, PlaybackOutcome::Completed { played: 3, skipped: 0 });
    assert_eq!(output.labels(), ["a", "b", "c"]);
    // 100 ms of audio, then 300 ms / 2.0 of silence.
    assert_eq!(
        output.start_times(),
        [
            Duration::ZERO,
            Duration::from_millis(250),
            Duration::from_millis(500)
        ]
    );
    // No pause after the last unit.
    assert_eq!(started.elapsed(), Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn units_are_resolved_concurrently_before_playback() {
    let output = RecordingOutput::new(CLIP);
    let provider = ScriptedProvider::default()
        .delay("a", Duration::from_millis(200))
        .delay("b", Duration::from_millis(200));
    let seq = sequencer(provider, Arc::clone(&output), 1.0);

    seq.play_sequence(units(&["a", "b"], 0)).await;

    assert_eq!(
        output.start_times(),
        [Duration::from_millis(200), Duration::from_millis(300)]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_units_are_skipped() {
    let output = RecordingOutput::new(CLIP);
    let seq = sequencer(ScriptedProvider::default().fail("b"), Arc::clone(&output), 1.0);

    let outcome = seq.play_sequence(units(&["a", "b", "c"], 0)).await;

    assert_eq!(outcome, PlaybackOutcome::Completed { played: 2, skipped: 1 });
    assert_eq!(output.labels(), ["a", "c"]);
}

#[tokio::test(start_paused = true)]
async fn failed_unit_adds_no_pause_of_its_own() {
    let output = RecordingOutput::new(CLIP);
    let seq = sequencer(ScriptedProvider::default().fail("a"), Arc::clone(&output), 2.0);
    let units = vec![
        NarrationUnit::text("a", 300),
        NarrationUnit::text("b", 300),
        NarrationUnit::text("c", 300),
    ];

    let outcome = seq.play_sequence(units).await;

    assert_eq!(outcome, PlaybackOutcome::Completed { played: 2, skipped: 1 });
    assert_eq!(output.labels(), ["b", "c"]);
    assert_eq!(
        output.start_times(),
        [Duration::ZERO, Duration::from_millis(250)]
    );
}

#[tokio::test(start_paused = true)]
async fn pause_before_a_failed_unit_still_applies() {
    let output = RecordingOutput::new(CLIP);
    let seq = sequencer(ScriptedProvider::default().fail("b"), Arc::clone(&output), 1.0);
    let units = vec![
        NarrationUnit::text("a", 300),
        NarrationUnit::text("b", 1000),
        NarrationUnit::text("c", 0),
    ];

    let outcome = seq.play_sequence(units).await;

    assert_eq!(outcome, PlaybackOutcome::Completed { played: 2, skipped: 1 });
    assert_eq!(
        output.start_times(),
        [Duration::ZERO, Duration::from_millis(400)]
    );
}

#[tokio::test(start_paused = true)]
async fn undecodable_audio_is_skipped_but_keeps_its_pause() {
    let output = RecordingOutput::rejecting(CLIP, "bad");
    let seq = sequencer(ScriptedProvider::default(), Arc::clone(&output), 1.0);
    let units = vec![NarrationUnit::text("bad", 300), NarrationUnit::text("ok", 0)];

    let outcome = seq.play_sequence(units).await;

    assert_eq!(outcome, PlaybackOutcome::Completed { played: 1, skipped: 1 });
    assert_eq!(output.labels(), ["ok"]);
    // Finished instantly, then the 300 ms pause.
    assert_eq!(output.start_times(), [Duration::from_millis(300)]);
}

#[tokio::test(start_paused = true)]
async fn empty_sequence_completes_immediately() {
    let output = RecordingOutput::new(CLIP);
    let seq = sequencer(ScriptedProvider::default(), Arc::clone(&output), 1.0);

    let outcome = seq.play_sequence(Vec::new()).await;

    assert_eq!(outcome, PlaybackOutcome::Completed { played: 0, skipped: 0 });
    assert!(output.labels().is_empty());
}

// ── Cancellation ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn newer_sequence_cuts_off_older_one_during_pause() {
    let output = RecordingOutput::new(CLIP);
    let seq = sequencer(ScriptedProvider::default(), Arc::clone(&output), 1.0);

    let first = seq.play(units(&["a", "b", "c"], 350));
    // "a" has finished; the first run is inside its pause.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let second = seq.play(units(&["x"], 0));

    assert_eq!(first.await.unwrap(), PlaybackOutcome::Superseded);
    assert_eq!(
        second.await.unwrap(),
        PlaybackOutcome::Completed { played: 1, skipped: 0 }
    );
    assert_eq!(output.labels(), ["a", "x"]);
}

#[tokio::test(start_paused = true)]
async fn newer_sequence_cuts_off_older_one_during_resolution() {
    let output = RecordingOutput::new(CLIP);
    let provider = ScriptedProvider::default().delay("slow", Duration::from_secs(1));
    let seq = sequencer(provider, Arc::clone(&output), 1.0);

    let first = seq.play(units(&["slow"], 0));
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = seq.play(units(&["fast"], 0));

    assert_eq!(first.await.unwrap(), PlaybackOutcome::Superseded);
    second.await.unwrap();
    // Long after the slow unit would have resolved, it still never played.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(output.labels(), ["fast"]);
}

#[tokio::test(start_paused = true)]
async fn every_play_silences_the_output() {
    let output = RecordingOutput::new(CLIP);
    let seq = sequencer(ScriptedProvider::default(), Arc::clone(&output), 1.0);

    seq.play_sequence(units(&["a"], 0)).await;
    seq.play_sequence(units(&["b"], 0)).await;

    assert_eq!(output.stops.load(Ordering::SeqCst), 2);
    assert_eq!(seq.current_generation().0, 2);
}

#[tokio::test(start_paused = true)]
async fn stop_halts_without_starting_a_new_generation() {
    let output = RecordingOutput::new(CLIP);
    let seq = sequencer(ScriptedProvider::default(), Arc::clone(&output), 1.0);

    let run = seq.play(units(&["a", "b"], 0));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let generation = seq.current_generation();
    seq.stop();

    assert_eq!(run.await.unwrap(), PlaybackOutcome::Stopped);
    assert_eq!(output.labels(), ["a"]);
    assert_eq!(seq.current_generation(), generation);

    // The sequencer is usable again afterwards.
    let outcome = seq.play_sequence(units(&["c"], 0)).await;
    assert_eq!(outcome, PlaybackOutcome::Completed { played: 1, skipped: 0 });
}

#[tokio::test(start_paused = true)]
async fn playback_started_after_stop_is_silenced() {
    let output = Arc::new(LateStartOutput::default());
    let seq = sequencer(ScriptedProvider::default(), Arc::clone(&output), 1.0);
    let _ = output.sequencer.set(seq.clone());

    let outcome = seq.play_sequence(units(&["a", "b"], 0)).await;

    assert_eq!(outcome, PlaybackOutcome::Stopped);
    assert_eq!(*output.sounding.lock().unwrap(), None);
}
