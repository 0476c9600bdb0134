//! ID types for players and audio resources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for player IDs.
static PLAYER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Global counter for stream IDs.
static STREAM_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a playback handle.
///
/// IDs are never reused within a process, so two handles with the same ID
/// are the same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u64);

impl PlayerId {
    /// Creates a new unique player ID.
    #[must_use]
    pub fn new() -> Self {
        Self(PLAYER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a player ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Unique identifier for a decoded audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(u64);

impl StreamId {
    /// Creates a new unique stream ID.
    #[must_use]
    pub fn new() -> Self {
        Self(STREAM_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}
