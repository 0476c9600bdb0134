//! Reusable playback handles.
//!
//! A [`PlaybackHandle`] plays one clip at a time. It is either idle (owned by
//! the pool, or freshly made by the factory) or active (owned by the scene
//! tree it was attached to until its clip ends). When the clip ends the
//! tree fires the handle's completion callback, which was installed by the
//! factory and hands the handle back to its pool.

use std::fmt;
use std::sync::{Arc, Weak};

use chime_common::PlayerId;
use tracing::{debug, trace};

use crate::bus::BusName;
use crate::engine::{sanitize_pitch_scale, Voice, VoiceParams};
use crate::scene::SceneLifetime;
use crate::stream::AudioStream;

/// Action run once per play when a handle's clip ends.
pub type FinishedCallback = Arc<dyn Fn(PlaybackHandle) + Send + Sync>;

/// Whether a handle is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleState {
    /// Not playing; eligible for reuse or purge.
    #[default]
    Idle,
    /// Playing, owned by the play request until completion.
    Active,
}

/// One reusable unit capable of playing a single sound at a time.
pub struct PlaybackHandle {
    id: PlayerId,
    stream: Option<AudioStream>,
    volume_db: f32,
    pitch_scale: f32,
    bus: BusName,
    /// Lifetime of the scene this handle was attached to.
    attachment: Option<Weak<SceneLifetime>>,
    state: HandleState,
    voice: Box<dyn Voice>,
    on_finished: FinishedCallback,
}

impl fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("id", &self.id)
            .field("stream", &self.stream.as_ref().map(AudioStream::id))
            .field("volume_db", &self.volume_db)
            .field("pitch_scale", &self.pitch_scale)
            .field("bus", &self.bus)
            .field("attached", &self.is_attached())
            .field("valid", &self.is_valid())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl PlaybackHandle {
    /// Build an idle, unattached handle.
    pub(crate) fn new(voice: Box<dyn Voice>, on_finished: FinishedCallback) -> Self {
        Self {
            id: PlayerId::new(),
            stream: None,
            volume_db: 0.0,
            pitch_scale: 1.0,
            bus: BusName::master(),
            attachment: None,
            state: HandleState::Idle,
            voice,
            on_finished,
        }
    }

    /// Get the handle ID.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// The clip assigned to this handle, if any.
    #[must_use]
    pub fn stream(&self) -> Option<&AudioStream> {
        self.stream.as_ref()
    }

    /// Volume offset in decibels.
    #[must_use]
    pub const fn volume_db(&self) -> f32 {
        self.volume_db
    }

    /// Pitch multiplier.
    #[must_use]
    pub const fn pitch_scale(&self) -> f32 {
        self.pitch_scale
    }

    /// Target bus.
    #[must_use]
    pub fn bus(&self) -> &BusName {
        &self.bus
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> HandleState {
        self.state
    }

    /// Check if the handle is playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == HandleState::Active
    }

    /// Check if the handle has been attached to a scene.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Check if the scene this handle belongs to is still alive.
    ///
    /// Unattached handles are valid. Once the scene is torn down the handle
    /// stays invalid for good.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.attachment
            .as_ref()
            .map_or(true, |lifetime| lifetime.strong_count() > 0)
    }

    /// Check if the handle is bound to exactly this scene lifetime.
    pub(crate) fn is_attached_to(&self, lifetime: &Arc<SceneLifetime>) -> bool {
        self.attachment
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(lifetime)))
    }

    /// Assign the clip to play.
    pub fn set_stream(&mut self, stream: Option<AudioStream>) {
        self.stream = stream;
    }

    /// Set the volume offset in decibels.
    pub fn set_volume_db(&mut self, volume_db: f32) {
        self.volume_db = volume_db;
    }

    /// Set the pitch multiplier. Non-finite values mean normal pitch.
    pub fn set_pitch_scale(&mut self, pitch_scale: f32) {
        self.pitch_scale = sanitize_pitch_scale(pitch_scale);
    }

    /// Set the target bus.
    pub fn set_bus(&mut self, bus: BusName) {
        self.bus = bus;
    }

    /// Bind to a scene lifetime. No-op if already attached.
    pub(crate) fn attach_to(&mut self, lifetime: &Arc<SceneLifetime>) -> bool {
        if self.attachment.is_some() {
            return false;
        }
        self.attachment = Some(Arc::downgrade(lifetime));
        true
    }

    /// Start the assigned clip from the beginning.
    pub(crate) fn start(&mut self) {
        let Some(stream) = self.stream.clone() else {
            trace!("{} has no stream, not starting", self.id);
            return;
        };

        self.voice.start(&VoiceParams {
            stream,
            volume_db: self.volume_db,
            pitch_scale: self.pitch_scale,
            bus: self.bus.clone(),
        });
        self.state = HandleState::Active;
    }

    /// True when an active handle's clip has played out.
    pub(crate) fn poll_finished(&self) -> bool {
        self.state == HandleState::Active && self.voice.is_finished()
    }

    /// Go idle and run the completion callback.
    pub(crate) fn finish(mut self) {
        if self.state != HandleState::Active {
            return;
        }
        self.state = HandleState::Idle;
        trace!("{} finished", self.id);

        let on_finished = Arc::clone(&self.on_finished);
        (*on_finished)(self);
    }

    /// Stop playback and discard the handle.
    pub fn free(mut self) {
        self.voice.stop();
        debug!("Freed {}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SilentVoice, MAX_PITCH_SCALE, MIN_PITCH_SCALE};
    use parking_lot::Mutex;

    fn handle_with_sink(sink: Arc<Mutex<Vec<PlayerId>>>) -> PlaybackHandle {
        PlaybackHandle::new(
            Box::new(SilentVoice),
            Arc::new(move |handle: PlaybackHandle| sink.lock().push(handle.id())),
        )
    }

    fn blip() -> AudioStream {
        AudioStream::from_samples(vec![0.0; 64], 1, 8_000)
    }

    #[test]
    fn test_new_handle_is_fresh() {
        let handle = handle_with_sink(Arc::default());
        assert_eq!(handle.state(), HandleState::Idle);
        assert!(handle.is_valid());
        assert!(!handle.is_attached());
        assert!(handle.stream().is_none());
        assert!(handle.bus().is_master());
    }

    #[test]
    fn test_validity_follows_lifetime() {
        let mut handle = handle_with_sink(Arc::default());
        let lifetime = Arc::new(SceneLifetime::new(0));

        assert!(handle.attach_to(&lifetime));
        assert!(handle.is_attached());
        assert!(handle.is_valid());

        drop(lifetime);
        assert!(!handle.is_valid());
        assert!(handle.is_attached());
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut handle = handle_with_sink(Arc::default());
        let first = Arc::new(SceneLifetime::new(0));
        let second = Arc::new(SceneLifetime::new(1));

        assert!(handle.attach_to(&first));
        assert!(!handle.attach_to(&second));

        drop(first);
        assert!(!handle.is_valid());
    }

    #[test]
    fn test_start_without_stream_stays_idle() {
        let mut handle = handle_with_sink(Arc::default());
        handle.start();
        assert_eq!(handle.state(), HandleState::Idle);
        assert!(!handle.poll_finished());
    }

    #[test]
    fn test_finish_fires_callback_once() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let mut handle = handle_with_sink(Arc::clone(&sink));
        let id = handle.id();

        handle.set_stream(Some(blip()));
        handle.start();
        assert!(handle.is_playing());
        // SilentVoice ends as soon as it starts.
        assert!(handle.poll_finished());

        handle.finish();
        assert_eq!(*sink.lock(), vec![id]);
    }

    #[test]
    fn test_finish_on_idle_handle_is_ignored() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let handle = handle_with_sink(Arc::clone(&sink));
        handle.finish();
        assert!(sink.lock().is_empty());
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut handle = handle_with_sink(Arc::default());
        handle.set_pitch_scale(0.0);
        assert!((handle.pitch_scale() - MIN_PITCH_SCALE).abs() < f32::EPSILON);
        handle.set_pitch_scale(100.0);
        assert!((handle.pitch_scale() - MAX_PITCH_SCALE).abs() < f32::EPSILON);
        handle.set_pitch_scale(f32::NAN);
        assert!((handle.pitch_scale() - 1.0).abs() < f32::EPSILON);
    }
}
