//! Playable audio handles.

use std::fmt;
use std::sync::Arc;

/// Container format of fetched audio bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

/// Encoded audio held in memory. Cloning is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Arc<[u8]>,
    format: AudioFormat,
}

impl AudioClip {
    pub fn new(bytes: impl Into<Arc<[u8]>>, format: AudioFormat) -> Self {
        Self {
            bytes: bytes.into(),
            format,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether two handles share the same allocation.
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What a provider hands to the audio output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayableAudio {
    /// Encoded audio to decode and play.
    Clip(AudioClip),
    /// Text for the OS speech engine, optionally with a voice id.
    Utterance { text: String, voice: Option<String> },
}

/// Output parameters read from settings at the start of a sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParams {
    /// 0.0 to 1.0.
    pub volume: f32,
    /// 0.5 to 2.0.
    pub speed: f32,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            speed: 1.0,
        }
    }
}
