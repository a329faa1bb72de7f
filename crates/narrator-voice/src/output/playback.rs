//! Clip playback via `rodio`.

use std::io::Cursor;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;

use crate::audio::{AudioClip, PlaybackParams};
use crate::error::VoiceError;

/// Owns the output stream and the sink of the clip currently playing.
pub(super) struct ClipPlayback {
    /// rodio output stream (must be kept alive).
    _stream: OutputStream,

    /// Handle used to create sinks.
    stream_handle: OutputStreamHandle,

    /// Sink of the clip currently playing (if any).
    sink: Option<Arc<Sink>>,
}

impl ClipPlayback {
    /// Open the default output device.
    pub(super) fn new() -> Result<Self, VoiceError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;

        tracing::info!("Audio playback initialized on default output device");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
        })
    }

    /// Decode and start a clip, replacing anything already playing.
    ///
    /// The returned receiver resolves (or errors) when the clip drains or is
    /// stopped.
    pub(super) fn play(
        &mut self,
        clip: &AudioClip,
        params: PlaybackParams,
    ) -> Result<oneshot::Receiver<()>, VoiceError> {
        self.stop();

        let source = Decoder::new(Cursor::new(clip.shared_bytes()))
            .map_err(|e| VoiceError::Decode(e.to_string()))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;
        sink.set_volume(params.volume.clamp(0.0, 1.0));
        sink.set_speed(params.speed.max(0.1));
        sink.append(source);

        let sink = Arc::new(sink);
        self.sink = Some(Arc::clone(&sink));

        let (done_tx, done_rx) = oneshot::channel();
        // `sleep_until_end()` returns when the queue drains or `stop()` is
        // called on the sink.
        std::thread::spawn(move || {
            sink.sleep_until_end();
            let _ = done_tx.send(());
        });

        tracing::debug!(format = ?clip.format(), bytes = clip.len(), "Clip playback started");
        Ok(done_rx)
    }

    /// Stop any active playback immediately.
    pub(super) fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            tracing::debug!("Clip playback stopped");
        }
    }
}
