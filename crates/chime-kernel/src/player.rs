//! Configured one-shot emitter.
//!
//! A [`OneShotPlayer`] remembers a clip and how to play it. Every call to
//! `play` fires a new pooled sound; sounds already started keep playing
//! when the player itself is dropped.

use std::path::PathBuf;

use chime_common::PlayerId;
use serde::{Deserialize, Serialize};

use crate::audio_backend::AudioResult;
use crate::bus::BusName;
use crate::manager::SoundManager;
use crate::scene::SceneTree;
use crate::stream::AudioStream;

/// Serializable description of a [`OneShotPlayer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneShotPlayerSettings {
    /// Audio file to load, if any
    pub stream_path: Option<PathBuf>,
    /// Volume offset in decibels
    pub volume_db: f32,
    /// Pitch and tempo multiplier
    pub pitch_scale: f32,
    /// Target bus; `None` plays on the default bus
    pub bus: Option<String>,
}

impl Default for OneShotPlayerSettings {
    fn default() -> Self {
        Self {
            stream_path: None,
            volume_db: 0.0,
            pitch_scale: 1.0,
            bus: None,
        }
    }
}

/// A clip plus the parameters to play it with.
#[derive(Debug, Clone)]
pub struct OneShotPlayer {
    /// Clip to play. With no clip, `play` does nothing.
    pub stream: Option<AudioStream>,
    /// Volume offset in decibels.
    pub volume_db: f32,
    /// Pitch and tempo multiplier; 2.0 doubles the pitch.
    pub pitch_scale: f32,
    /// Target bus. Unknown buses fall back to master at playback time.
    pub bus: Option<BusName>,
}

impl Default for OneShotPlayer {
    fn default() -> Self {
        Self {
            stream: None,
            volume_db: 0.0,
            pitch_scale: 1.0,
            bus: None,
        }
    }
}

impl OneShotPlayer {
    /// Create a player for `stream` with default parameters.
    #[must_use]
    pub fn new(stream: AudioStream) -> Self {
        Self {
            stream: Some(stream),
            ..Self::default()
        }
    }

    /// Build a player from settings, loading its clip from disk.
    pub fn from_settings(settings: &OneShotPlayerSettings) -> AudioResult<Self> {
        let stream = settings
            .stream_path
            .as_ref()
            .map(AudioStream::load)
            .transpose()?;

        Ok(Self {
            stream,
            volume_db: settings.volume_db,
            pitch_scale: settings.pitch_scale,
            bus: settings.bus.as_deref().map(BusName::new),
        })
    }

    /// Set the volume offset.
    #[must_use]
    pub fn with_volume_db(mut self, volume_db: f32) -> Self {
        self.volume_db = volume_db;
        self
    }

    /// Set the pitch multiplier.
    #[must_use]
    pub fn with_pitch_scale(mut self, pitch_scale: f32) -> Self {
        self.pitch_scale = pitch_scale;
        self
    }

    /// Set the target bus.
    #[must_use]
    pub fn with_bus(mut self, bus: impl Into<BusName>) -> Self {
        self.bus = Some(bus.into());
        self
    }

    /// Play through the global manager on the current scene.
    pub fn play(&self) {
        self.play_with(SoundManager::global());
    }

    /// Play through `manager` on its current scene.
    pub fn play_with(&self, manager: &SoundManager) {
        manager.play_configured(
            self.stream.as_ref(),
            self.volume_db,
            self.pitch_scale,
            self.bus.as_ref(),
        );
    }

    /// Play through `manager` on an explicit scene.
    pub fn play_in(&self, manager: &SoundManager, tree: &mut SceneTree) -> Option<PlayerId> {
        manager.play_sound(
            tree,
            self.stream.as_ref(),
            self.volume_db,
            self.pitch_scale,
            self.bus.as_ref(),
        )
    }
}
