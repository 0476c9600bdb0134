//! Audio Backend with Rodio Integration
//!
//! This module provides device output for pooled playback using rodio.
//! It includes:
//!
//! - `AudioDevice`: Wrapper around rodio's output stream
//! - `RodioEngine`: [`PlaybackEngine`] handing out one sink per voice
//! - `RodioVoice`: A sink configured from volume, pitch and bus gain
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      RodioEngine                         │
//! │  ┌───────────────┐  ┌────────────────┐  ┌─────────────┐  │
//! │  │  AudioDevice  │──│   RodioVoice   │──│  BusLayout  │  │
//! │  │  (rodio)      │  │  (one sink)    │  │  (gains)    │  │
//! │  └───────────────┘  └────────────────┘  └─────────────┘  │
//! │          │                  │                            │
//! │          ▼                  ▼                            │
//! │    OutputStream         Sink[0..N]                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use chime_kernel::prelude::*;
//!
//! let device = AudioDevice::new()?;
//! let engine = RodioEngine::new(&device, BusLayout::new());
//! let tree = SceneTree::new(Arc::new(engine));
//! ```

use std::path::PathBuf;

use rodio::{OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;
use tracing::{error, info, trace};

use crate::bus::{db_to_linear, BusLayout, SharedBuses};
use crate::engine::{sanitize_pitch_scale, PlaybackEngine, SilentVoice, Voice, VoiceParams};

/// Audio error types.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to initialize audio device.
    #[error("Failed to initialize audio device: {0}")]
    DeviceInitFailed(String),

    /// Failed to create audio sink.
    #[error("Failed to create audio sink: {0}")]
    SinkCreationFailed(String),

    /// Failed to load audio file.
    #[error("Failed to load audio file '{path}': {message}")]
    LoadFailed {
        /// Path to the file that failed to load.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to decode audio data.
    #[error("Failed to decode audio: {0}")]
    DecodeFailed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Wraps rodio's output stream for audio playback.
///
/// The stream must outlive every engine created from it; dropping the
/// device silences all voices.
pub struct AudioDevice {
    /// The output stream (must be kept alive).
    _stream: OutputStream,
    /// Handle for creating sinks.
    handle: OutputStreamHandle,
}

impl std::fmt::Debug for AudioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDevice").finish_non_exhaustive()
    }
}

impl AudioDevice {
    /// Create a new audio device using the default output.
    pub fn new() -> AudioResult<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::DeviceInitFailed(e.to_string()))?;

        info!("Audio device initialized");

        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Get a reference to the output stream handle.
    #[must_use]
    pub fn handle(&self) -> &OutputStreamHandle {
        &self.handle
    }
}

/// Playback engine backed by an audio output device.
pub struct RodioEngine {
    handle: OutputStreamHandle,
    buses: SharedBuses,
}

impl std::fmt::Debug for RodioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioEngine")
            .field("buses", &self.buses.read().len())
            .finish_non_exhaustive()
    }
}

impl RodioEngine {
    /// Create an engine that plays on `device`.
    #[must_use]
    pub fn new(device: &AudioDevice, buses: BusLayout) -> Self {
        info!("Rodio engine ready with {} buses", buses.len());
        Self {
            handle: device.handle().clone(),
            buses: buses.into_shared(),
        }
    }

    /// Bus layout shared with every voice; edits apply to the next start.
    #[must_use]
    pub fn buses(&self) -> &SharedBuses {
        &self.buses
    }
}

impl PlaybackEngine for RodioEngine {
    fn create_voice(&self) -> Box<dyn Voice> {
        match Sink::try_new(&self.handle) {
            Ok(sink) => Box::new(RodioVoice {
                sink,
                buses: SharedBuses::clone(&self.buses),
            }),
            Err(e) => {
                error!("{}", AudioError::SinkCreationFailed(e.to_string()));
                Box::new(SilentVoice)
            },
        }
    }
}

/// A voice playing through one rodio sink.
pub struct RodioVoice {
    sink: Sink,
    buses: SharedBuses,
}

impl Voice for RodioVoice {
    fn start(&mut self, params: &VoiceParams) {
        let gain = self.buses.read().output_gain(&params.bus);
        let volume = db_to_linear(params.volume_db) * gain;
        let speed = sanitize_pitch_scale(params.pitch_scale);

        self.sink.clear();
        self.sink.set_volume(volume);
        self.sink.set_speed(speed);
        self.sink.append(params.stream.to_source());
        self.sink.play();

        trace!(
            "Sink started {:?} at volume {:.3}, speed {:.2}",
            params.stream.id(),
            volume,
            speed
        );
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}
