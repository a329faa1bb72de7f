//! OS speech engine wrapper.
//!
//! Built on the `tts` crate when the `system-voice` feature is enabled.
//! Without it the engine reports itself unavailable and the `system`
//! provider's units are skipped.

use crate::audio::PlaybackParams;
use crate::error::VoiceError;
use crate::providers::VoiceInfo;

/// Map a 0.5–2.0 speed multiplier onto an engine's rate range.
///
/// Below 1.0 interpolates between `min` and `normal`, above 1.0 between
/// `normal` and `max`.
pub fn map_rate(speed: f32, min: f32, normal: f32, max: f32) -> f32 {
    if speed <= 1.0 {
        (normal - min).mul_add(speed, min)
    } else {
        (max - normal).mul_add(speed - 1.0, normal)
    }
}

/// Map a 0.0–1.0 volume onto an engine's volume range.
pub fn map_volume(volume: f32, min: f32, max: f32) -> f32 {
    (max - min).mul_add(volume.clamp(0.0, 1.0), min)
}

#[cfg(feature = "system-voice")]
pub(super) struct SystemVoice {
    tts: tts::Tts,
}

#[cfg(feature = "system-voice")]
impl SystemVoice {
    pub(super) fn new() -> Result<Self, VoiceError> {
        let tts = tts::Tts::default()
            .map_err(|e| VoiceError::SystemVoice(format!("failed to initialize: {e}")))?;
        tracing::info!("System speech engine initialized");
        Ok(Self { tts })
    }

    pub(super) fn speak(
        &mut self,
        text: &str,
        voice: Option<&str>,
        params: PlaybackParams,
    ) -> Result<(), VoiceError> {
        let rate = map_rate(
            params.speed,
            self.tts.min_rate(),
            self.tts.normal_rate(),
            self.tts.max_rate(),
        );
        let volume = map_volume(params.volume, self.tts.min_volume(), self.tts.max_volume());
        // Engines without rate/volume control reject these; speaking still works.
        let _ = self.tts.set_rate(rate);
        let _ = self.tts.set_volume(volume);

        if let Some(wanted) = voice.filter(|v| !v.is_empty()) {
            if let Ok(voices) = self.tts.voices() {
                if let Some(found) = voices.into_iter().find(|v| v.id() == wanted) {
                    let _ = self.tts.set_voice(&found);
                }
            }
        }

        self.tts
            .speak(text, true)
            .map_err(|e| VoiceError::SystemVoice(e.to_string()))?;
        Ok(())
    }

    pub(super) fn is_speaking(&self) -> bool {
        self.tts.is_speaking().unwrap_or(false)
    }

    pub(super) fn stop(&mut self) {
        let _ = self.tts.stop();
    }

    pub(super) fn voices(&self) -> Result<Vec<VoiceInfo>, VoiceError> {
        let voices = self
            .tts
            .voices()
            .map_err(|e| VoiceError::SystemVoice(e.to_string()))?;
        Ok(voices
            .into_iter()
            .map(|v| VoiceInfo {
                id: v.id().to_string(),
                name: v.name().to_string(),
                language: v.language().to_string(),
                gender: v.gender().map(|g| match g {
                    tts::Gender::Male => crate::providers::VoiceGender::Male,
                    tts::Gender::Female => crate::providers::VoiceGender::Female,
                }),
            })
            .collect())
    }
}

#[cfg(not(feature = "system-voice"))]
pub(super) struct SystemVoice;

#[cfg(not(feature = "system-voice"))]
impl SystemVoice {
    pub(super) fn new() -> Result<Self, VoiceError> {
        Err(VoiceError::SystemVoice(
            "built without the `system-voice` feature".to_string(),
        ))
    }

    pub(super) fn speak(
        &mut self,
        _text: &str,
        _voice: Option<&str>,
        _params: PlaybackParams,
    ) -> Result<(), VoiceError> {
        Self::new().map(|_| ())
    }

    pub(super) const fn is_speaking(&self) -> bool {
        false
    }

    pub(super) const fn stop(&mut self) {}

    pub(super) fn voices(&self) -> Result<Vec<VoiceInfo>, VoiceError> {
        Self::new().map(|_| Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_mapping_hits_anchor_points() {
        let (min, normal, max) = (0.1, 1.0, 10.0);
        assert!((map_rate(1.0, min, normal, max) - normal).abs() < 1e-6);
        assert!((map_rate(2.0, min, normal, max) - max).abs() < 1e-6);
        assert!((map_rate(0.5, min, normal, max) - 0.55).abs() < 1e-6);
    }

    #[test]
    fn volume_mapping_is_linear() {
        assert!((map_volume(0.0, 0.0, 2.0) - 0.0).abs() < 1e-6);
        assert!((map_volume(0.5, 0.0, 2.0) - 1.0).abs() < 1e-6);
        assert!((map_volume(7.0, 0.0, 2.0) - 2.0).abs() < 1e-6);
    }
}
