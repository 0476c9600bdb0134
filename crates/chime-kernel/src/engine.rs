//! Playback engine capability.
//!
//! The pool never talks to an audio device directly. Each handle owns a
//! [`Voice`] obtained from a [`PlaybackEngine`]; the voice starts a clip and
//! reports when it has run to its natural end.

use std::sync::Arc;

use crate::bus::BusName;
use crate::stream::AudioStream;

/// Lowest pitch multiplier a voice will accept.
pub const MIN_PITCH_SCALE: f32 = 0.01;

/// Highest pitch multiplier a voice will accept.
pub const MAX_PITCH_SCALE: f32 = 16.0;

/// Bring a pitch multiplier into the accepted range.
///
/// NaN and infinities mean normal pitch.
#[must_use]
pub fn sanitize_pitch_scale(pitch_scale: f32) -> f32 {
    if pitch_scale.is_finite() {
        pitch_scale.clamp(MIN_PITCH_SCALE, MAX_PITCH_SCALE)
    } else {
        1.0
    }
}

/// Everything a voice needs to start one clip.
#[derive(Debug, Clone)]
pub struct VoiceParams {
    /// Clip to play from the beginning.
    pub stream: AudioStream,
    /// Volume offset in decibels.
    pub volume_db: f32,
    /// Pitch and tempo multiplier.
    pub pitch_scale: f32,
    /// Requested bus; unknown buses play on master.
    pub bus: BusName,
}

/// One playback channel that can play a single clip at a time.
pub trait Voice: Send {
    /// Start `params.stream` from the beginning, replacing anything queued.
    fn start(&mut self, params: &VoiceParams);

    /// True once the last started clip has played out, or if none was started.
    fn is_finished(&self) -> bool;

    /// Stop immediately.
    fn stop(&mut self);
}

/// Source of voices.
pub trait PlaybackEngine: Send + Sync {
    /// Create a new idle voice. Never fails; an engine that cannot allocate
    /// output returns a voice that finishes immediately.
    fn create_voice(&self) -> Box<dyn Voice>;
}

/// Shared engine reference held by a scene tree.
pub type EngineRef = Arc<dyn PlaybackEngine>;

/// A voice that plays nothing and is always finished.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentVoice;

impl Voice for SilentVoice {
    fn start(&mut self, _params: &VoiceParams) {}

    fn is_finished(&self) -> bool {
        true
    }

    fn stop(&mut self) {}
}
