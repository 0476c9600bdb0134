//! Headless playback engine.
//!
//! Plays nothing, but keeps time: a voice finishes once the engine clock has
//! moved past the end of its clip (scaled by pitch). Used on servers without
//! an output device and to drive pool behaviour deterministically in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chime_common::StreamId;
use parking_lot::Mutex;
use tracing::trace;

use crate::bus::{BusLayout, BusName, SharedBuses};
use crate::engine::{sanitize_pitch_scale, PlaybackEngine, Voice, VoiceParams};

/// A single voice start as seen by the headless engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StartRecord {
    /// Engine-local voice number.
    pub voice: u64,
    /// Clip that was started.
    pub stream: StreamId,
    /// Requested volume offset.
    pub volume_db: f32,
    /// Effective pitch multiplier.
    pub pitch_scale: f32,
    /// Bus the voice actually mixed into after fallback.
    pub bus: BusName,
    /// Linear output gain from the bus layout.
    pub gain: f32,
    /// Engine time at start.
    pub at: Duration,
}

#[derive(Debug, Default)]
struct Shared {
    /// Elapsed engine time in nanoseconds.
    clock: AtomicU64,
    next_voice: AtomicU64,
    stopped: AtomicU64,
    starts: Mutex<Vec<StartRecord>>,
}

impl Shared {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.clock.load(Ordering::Acquire))
    }
}

/// Clock-driven engine without audio output.
#[derive(Debug)]
pub struct HeadlessEngine {
    shared: Arc<Shared>,
    buses: SharedBuses,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new(BusLayout::new())
    }
}

impl HeadlessEngine {
    /// Create a headless engine mixing into `buses`.
    #[must_use]
    pub fn new(buses: BusLayout) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            buses: buses.into_shared(),
        }
    }

    /// Move the engine clock forward.
    pub fn advance(&self, delta: Duration) {
        let nanos = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        self.shared.clock.fetch_add(nanos, Ordering::AcqRel);
    }

    /// Current engine time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.shared.now()
    }

    /// Number of voices created so far.
    #[must_use]
    pub fn voices_created(&self) -> u64 {
        self.shared.next_voice.load(Ordering::Relaxed)
    }

    /// Number of explicit voice stops so far.
    #[must_use]
    pub fn voices_stopped(&self) -> u64 {
        self.shared.stopped.load(Ordering::Relaxed)
    }

    /// Bus layout shared with every voice; edits apply to the next start.
    #[must_use]
    pub fn buses(&self) -> &SharedBuses {
        &self.buses
    }

    /// Every voice start, oldest first.
    #[must_use]
    pub fn starts(&self) -> Vec<StartRecord> {
        self.shared.starts.lock().clone()
    }

    /// The most recent voice start.
    #[must_use]
    pub fn last_start(&self) -> Option<StartRecord> {
        self.shared.starts.lock().last().cloned()
    }
}

impl PlaybackEngine for HeadlessEngine {
    fn create_voice(&self) -> Box<dyn Voice> {
        let voice = self.shared.next_voice.fetch_add(1, Ordering::Relaxed);
        Box::new(HeadlessVoice {
            voice,
            shared: Arc::clone(&self.shared),
            buses: SharedBuses::clone(&self.buses),
            ends_at: None,
        })
    }
}

struct HeadlessVoice {
    voice: u64,
    shared: Arc<Shared>,
    buses: SharedBuses,
    ends_at: Option<Duration>,
}

impl Voice for HeadlessVoice {
    fn start(&mut self, params: &VoiceParams) {
        let pitch_scale = sanitize_pitch_scale(params.pitch_scale);
        let (bus, gain) = {
            let layout = self.buses.read();
            (layout.resolve(&params.bus).name.clone(), layout.output_gain(&params.bus))
        };

        let now = self.shared.now();
        self.ends_at = Some(now + params.stream.duration().div_f64(f64::from(pitch_scale)));

        trace!("Headless voice {} started until {:?}", self.voice, self.ends_at);
        self.shared.starts.lock().push(StartRecord {
            voice: self.voice,
            stream: params.stream.id(),
            volume_db: params.volume_db,
            pitch_scale,
            bus,
            gain,
            at: now,
        });
    }

    fn is_finished(&self) -> bool {
        self.ends_at.map_or(true, |end| self.shared.now() >= end)
    }

    fn stop(&mut self) {
        self.ends_at = None;
        self.shared.stopped.fetch_add(1, Ordering::Relaxed);
    }
}
