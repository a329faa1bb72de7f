//! Dedicated audio thread: isolates `!Send` audio resources from the async runtime.
//!
//! `rodio::OutputStream` and the OS speech engine handle are `!Send` on some
//! platforms. Rather than using `unsafe impl Send/Sync`, both are confined to
//! a single OS thread and driven over channels.
//!
//! [`AudioThreadHandle`] is the `Send + Sync` proxy the output holds. Every
//! operation is routed through an [`AudioCommand`] sent to the thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use super::playback::ClipPlayback;
use super::system_voice::SystemVoice;
use crate::audio::{PlayableAudio, PlaybackParams};
use crate::error::VoiceError;
use crate::providers::VoiceInfo;

/// How often the thread checks whether the OS engine finished an utterance.
const SPEAKING_POLL: Duration = Duration::from_millis(50);

/// An engine that never reports speaking is treated as done after this long.
const SPEAKING_GRACE: Duration = Duration::from_millis(500);

/// Completion tracking for the utterance in progress.
struct PendingUtterance {
    done: oneshot::Sender<()>,
    started: Instant,
    seen_speaking: bool,
}

impl PendingUtterance {
    fn new(done: oneshot::Sender<()>) -> Self {
        Self {
            done,
            started: Instant::now(),
            seen_speaking: false,
        }
    }

    /// Update with the engine's current state; true once speech has ended.
    fn finished(&mut self, speaking: bool) -> bool {
        if speaking {
            self.seen_speaking = true;
            return false;
        }
        self.seen_speaking || self.started.elapsed() >= SPEAKING_GRACE
    }
}

/// Which play request the sounding audio belongs to.
#[derive(Debug, Default)]
struct Owner(Option<u64>);

impl Owner {
    fn claim(&mut self, token: u64) {
        self.0 = Some(token);
    }

    fn release(&mut self) {
        self.0 = None;
    }

    /// Release only if `token` still owns the output; true if it did.
    fn release_if(&mut self, token: u64) -> bool {
        if self.0 == Some(token) {
            self.0 = None;
            true
        } else {
            false
        }
    }
}

// ── Commands ───────────────────────────────────────────────────────

/// A command sent from the output to the audio thread.
enum AudioCommand {
    /// Start playing; replies with a receiver that resolves on completion.
    Play {
        token: u64,
        audio: PlayableAudio,
        params: PlaybackParams,
        reply: mpsc::Sender<Result<oneshot::Receiver<()>, VoiceError>>,
    },

    /// Stop any active playback or speech immediately (fire-and-forget).
    Stop,

    /// Stop only if the playback started under `token` is still sounding.
    StopIf(u64),

    /// List the OS engine's voices.
    ListVoices {
        reply: mpsc::Sender<Result<Vec<VoiceInfo>, VoiceError>>,
    },

    /// Shut down the audio thread, releasing all resources.
    Shutdown,
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// `Send + Sync` handle to the dedicated audio thread.
///
/// Request–reply methods block the caller until the thread responds; that is
/// local channel I/O plus the decode of one clip.
pub struct AudioThreadHandle {
    cmd_tx: mpsc::Sender<AudioCommand>,
    next_token: AtomicU64,
    thread: Option<thread::JoinHandle<()>>,
}

impl AudioThreadHandle {
    /// Spawn the audio thread, open the output device, and return the handle.
    ///
    /// Device errors are propagated back via a one-shot init channel. The OS
    /// speech engine is opened lazily on first use.
    pub fn spawn() -> Result<Self, VoiceError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), VoiceError>>();

        let thread = thread::Builder::new()
            .name("narrator-audio".into())
            .spawn(move || {
                Self::run(&cmd_rx, &init_tx);
            })
            .map_err(|e| {
                VoiceError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        // Wait for the audio thread to finish initialisation.
        init_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            next_token: AtomicU64::new(1),
            thread: Some(thread),
        })
    }

    /// Start playback. Returns the token naming this playback and a receiver
    /// that resolves when it ends or is stopped.
    pub fn play(
        &self,
        audio: PlayableAudio,
        params: PlaybackParams,
    ) -> Result<(u64, oneshot::Receiver<()>), VoiceError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let done = self.send_and_recv(|reply| AudioCommand::Play {
            token,
            audio,
            params,
            reply,
        })?;
        Ok((token, done))
    }

    /// Stop any active playback immediately (fire-and-forget).
    pub fn stop_playback(&self) {
        let _ = self.cmd_tx.send(AudioCommand::Stop);
    }

    /// Stop the playback started under `token`, if it is still the one
    /// sounding. Later playbacks are left alone.
    pub fn stop_if(&self, token: u64) {
        let _ = self.cmd_tx.send(AudioCommand::StopIf(token));
    }

    /// Voices offered by the OS speech engine.
    pub fn system_voices(&self) -> Result<Vec<VoiceInfo>, VoiceError> {
        self.send_and_recv(|reply| AudioCommand::ListVoices { reply })
    }

    /// Send a command that expects a `Result<T, VoiceError>` reply. Channel
    /// failures map to [`VoiceError::AudioThreadDied`].
    fn send_and_recv<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<Result<T, VoiceError>>) -> AudioCommand,
    ) -> Result<T, VoiceError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| VoiceError::AudioThreadDied)?;
        rx.recv().map_err(|_| VoiceError::AudioThreadDied)?
    }

    // ── Audio thread event loop ────────────────────────────────────

    /// Body of the audio thread. Owns `ClipPlayback` and the speech engine
    /// for their entire lifetime.
    fn run(cmd_rx: &mpsc::Receiver<AudioCommand>, init_tx: &mpsc::Sender<Result<(), VoiceError>>) {
        let mut playback = match ClipPlayback::new() {
            Ok(p) => p,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };

        if init_tx.send(Ok(())).is_err() {
            return;
        }

        let mut speech: Option<SystemVoice> = None;
        let mut utterance: Option<PendingUtterance> = None;
        let mut owner = Owner::default();

        loop {
            let cmd = match cmd_rx.recv_timeout(SPEAKING_POLL) {
                Ok(cmd) => cmd,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    let speaking = speech.as_ref().is_some_and(SystemVoice::is_speaking);
                    if utterance.as_mut().is_some_and(|u| u.finished(speaking)) {
                        if let Some(pending) = utterance.take() {
                            let _ = pending.done.send(());
                        }
                    }
                    continue;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            };

            match cmd {
                AudioCommand::Play {
                    token,
                    audio,
                    params,
                    reply,
                } => {
                    // Anything still sounding is replaced.
                    Self::halt(&mut playback, &mut speech);
                    utterance = None;

                    let result = match audio {
                        PlayableAudio::Clip(clip) => playback.play(&clip, params),
                        PlayableAudio::Utterance { text, voice } => {
                            Self::speak(&mut speech, &text, voice.as_deref(), params).map(|()| {
                                let (tx, rx) = oneshot::channel();
                                utterance = Some(PendingUtterance::new(tx));
                                rx
                            })
                        }
                    };
                    if result.is_ok() {
                        owner.claim(token);
                    } else {
                        owner.release();
                    }
                    let _ = reply.send(result);
                }

                AudioCommand::Stop => {
                    owner.release();
                    Self::halt(&mut playback, &mut speech);
                    // Dropping the sender wakes the waiting `play`.
                    utterance = None;
                }

                AudioCommand::StopIf(token) => {
                    if owner.release_if(token) {
                        tracing::debug!(token, "Stopping abandoned playback");
                        Self::halt(&mut playback, &mut speech);
                        utterance = None;
                    }
                }

                AudioCommand::ListVoices { reply } => {
                    let result = Self::engine(&mut speech).and_then(|engine| engine.voices());
                    let _ = reply.send(result);
                }

                AudioCommand::Shutdown => break,
            }
        }

        // `playback` and `speech` are dropped here, on the audio thread.
        tracing::debug!("Audio thread shutting down");
    }

    fn halt(playback: &mut ClipPlayback, speech: &mut Option<SystemVoice>) {
        playback.stop();
        if let Some(engine) = speech.as_mut() {
            engine.stop();
        }
    }

    fn engine(speech: &mut Option<SystemVoice>) -> Result<&mut SystemVoice, VoiceError> {
        if speech.is_none() {
            *speech = Some(SystemVoice::new()?);
        }
        speech.as_mut().ok_or(VoiceError::AudioThreadDied)
    }

    fn speak(
        speech: &mut Option<SystemVoice>,
        text: &str,
        voice: Option<&str>,
        params: PlaybackParams,
    ) -> Result<(), VoiceError> {
        Self::engine(speech)?.speak(text, voice, params)
    }
}

impl Drop for AudioThreadHandle {
    fn drop(&mut self) {
        // Best-effort shutdown; the thread may already be dead.
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
