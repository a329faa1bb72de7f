//! Audio output: the sink narration audio is played into.
//!
//! [`LocalAudioOutput`] plays through the default output device and the OS
//! speech engine. Tests substitute their own [`AudioOutput`].

mod playback;
mod system_voice;
mod thread;

use async_trait::async_trait;

pub use system_voice::{map_rate, map_volume};
pub use thread::AudioThreadHandle;

use crate::audio::{PlayableAudio, PlaybackParams};
use crate::error::VoiceError;
use crate::providers::VoiceInfo;

/// Where narration audio ends up.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play audio, resolving when it has finished or was interrupted by
    /// [`stop`](Self::stop).
    ///
    /// Dropping the returned future before it resolves must silence the
    /// audio it started, and nothing started by a later call.
    async fn play(&self, audio: PlayableAudio, params: PlaybackParams) -> Result<(), VoiceError>;

    /// Halt whatever is playing, synchronously.
    fn stop(&self);

    /// Voices offered by the OS speech engine behind this output.
    fn system_voices(&self) -> Result<Vec<VoiceInfo>, VoiceError> {
        Err(VoiceError::SystemVoice(
            "this output has no system voice".to_string(),
        ))
    }
}

/// Audio output on the default device, driven from a dedicated thread.
pub struct LocalAudioOutput {
    handle: AudioThreadHandle,
}

impl LocalAudioOutput {
    /// Open the default output device.
    pub fn open() -> Result<Self, VoiceError> {
        Ok(Self {
            handle: AudioThreadHandle::spawn()?,
        })
    }
}

/// Stops the playback behind a `play` future that is dropped mid-flight.
struct AbandonGuard<'a> {
    handle: &'a AudioThreadHandle,
    token: u64,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.handle.stop_if(self.token);
        }
    }
}

#[async_trait]
impl AudioOutput for LocalAudioOutput {
    async fn play(&self, audio: PlayableAudio, params: PlaybackParams) -> Result<(), VoiceError> {
        let (token, done) = self.handle.play(audio, params)?;
        let mut guard = AbandonGuard {
            handle: &self.handle,
            token,
            armed: true,
        };
        // A dropped sender means playback was stopped or replaced.
        let _ = done.await;
        guard.armed = false;
        Ok(())
    }

    fn stop(&self) {
        self.handle.stop_playback();
    }

    fn system_voices(&self) -> Result<Vec<VoiceInfo>, VoiceError> {
        self.handle.system_voices()
    }
}
