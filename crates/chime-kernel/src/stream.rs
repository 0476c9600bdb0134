//! Decoded audio clips.
//!
//! An [`AudioStream`] is the sound resource handed to a play request. Clips
//! are decoded up front and shared, so cloning a stream is cheap and the
//! same clip can play on any number of handles at once.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chime_common::StreamId;
use rodio::{Decoder, Source};
use tracing::debug;

use crate::audio_backend::{AudioError, AudioResult};

/// A decoded, in-memory audio clip.
#[derive(Clone)]
pub struct AudioStream {
    id: StreamId,
    name: Option<Arc<str>>,
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
}

impl fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioStream")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("samples", &self.samples.len())
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl PartialEq for AudioStream {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AudioStream {}

impl AudioStream {
    /// Create a stream from interleaved samples.
    #[must_use]
    pub fn from_samples(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            id: StreamId::new(),
            name: None,
            samples: Arc::from(samples),
            channels,
            sample_rate,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    /// Load and decode an audio file (WAV, MP3, ...).
    pub fn load(path: impl AsRef<Path>) -> AudioResult<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| AudioError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let stream = Self::decode(decoder).named(&path.display().to_string());
        debug!("Loaded sound: {:?} -> {:?}", path, stream.id);
        Ok(stream)
    }

    /// Decode an audio file held in memory.
    pub fn from_memory(data: &[u8], name: Option<&str>) -> AudioResult<Self> {
        let decoder = Decoder::new(Cursor::new(data.to_vec()))
            .map_err(|e| AudioError::DecodeFailed(e.to_string()))?;

        let stream = Self::decode(decoder);
        Ok(match name {
            Some(name) => stream.named(name),
            None => stream,
        })
    }

    fn decode<S>(source: S) -> Self
    where
        S: Source,
        S::Item: rodio::Sample,
        f32: rodio::cpal::FromSample<S::Item>,
    {
        let sample_rate = source.sample_rate();
        let channels = source.channels();
        let samples: Vec<f32> = source.convert_samples::<f32>().collect();
        Self::from_samples(samples, channels, sample_rate)
    }

    /// Get the stream ID.
    #[must_use]
    pub const fn id(&self) -> StreamId {
        self.id
    }

    /// Get the display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Interleaved sample data.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of channels.
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Check if the clip has no audio at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() || self.channels == 0 || self.sample_rate == 0
    }

    /// Length of the clip at normal speed.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.is_empty() {
            return Duration::ZERO;
        }
        let frames = self.samples.len() / usize::from(self.channels);
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Build a rodio source that plays this clip once.
    #[must_use]
    pub fn to_source(&self) -> rodio::buffer::SamplesBuffer<f32> {
        rodio::buffer::SamplesBuffer::new(self.channels, self.sample_rate, self.samples.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_duration() {
        let stream = AudioStream::from_samples(vec![0.0; 44_100 * 2], 2, 44_100);
        assert_eq!(stream.duration(), Duration::from_secs(1));
        assert!(!stream.is_empty());
    }

    #[test]
    fn test_empty_stream() {
        let stream = AudioStream::from_samples(Vec::new(), 1, 44_100);
        assert!(stream.is_empty());
        assert_eq!(stream.duration(), Duration::ZERO);
    }

    #[test]
    fn test_zero_rate_counts_as_empty() {
        let stream = AudioStream::from_samples(vec![0.5; 10], 1, 0);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_clones_share_identity() {
        let a = AudioStream::from_samples(vec![0.0; 4], 1, 8_000).named("blip");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.name(), Some("blip"));

        let c = AudioStream::from_samples(vec![0.0; 4], 1, 8_000);
        assert_ne!(a, c);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AudioStream::load("/nonexistent/blip.wav").expect_err("should fail");
        assert!(err.to_string().contains("blip.wav"));
    }

    #[test]
    fn test_from_memory_rejects_garbage() {
        assert!(AudioStream::from_memory(b"not audio", Some("junk")).is_err());
    }

    #[test]
    fn test_to_source_matches_format() {
        let stream = AudioStream::from_samples(vec![0.0; 8], 2, 22_050);
        let source = stream.to_source();
        assert_eq!(source.channels(), 2);
        assert_eq!(source.sample_rate(), 22_050);
    }
}
