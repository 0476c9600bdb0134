//! Bounded LIFO pool of idle playback handles.
//!
//! The most recently returned handle is served first since it is the most
//! likely to still be attached and valid. Handles whose scene was torn down
//! while they sat idle are purged lazily, at acquire time.

use chime_common::{ChimeConfig, PlayerId, MAX_POOLED_PLAYERS};
use tracing::debug;

use crate::handle::PlaybackHandle;

/// Pool activity counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Handles fabricated on a pool miss.
    pub created: u64,
    /// Acquisitions served from the pool.
    pub reused: u64,
    /// Idle handles dropped because their scene was torn down.
    pub purged_stale: u64,
    /// Returned handles freed because the pool was full.
    pub discarded_overflow: u64,
    /// Handles handed back after playback.
    pub returned: u64,
}

/// Pool of idle handles awaiting reuse.
#[derive(Debug)]
pub struct HandlePool {
    players: Vec<PlaybackHandle>,
    capacity: usize,
    stats: PoolStats,
}

impl Default for HandlePool {
    fn default() -> Self {
        Self::new(MAX_POOLED_PLAYERS)
    }
}

impl HandlePool {
    /// Create an empty pool holding at most `capacity` idle handles.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            players: Vec::with_capacity(capacity.min(MAX_POOLED_PLAYERS)),
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Create an empty pool sized from configuration.
    #[must_use]
    pub fn from_config(config: &ChimeConfig) -> Self {
        Self::new(config.max_pooled_players)
    }

    /// Take the most recently returned valid handle.
    ///
    /// Invalid handles found on top are freed on the way down. `None` means
    /// the caller has to fabricate a new handle.
    pub fn acquire(&mut self) -> Option<PlaybackHandle> {
        while let Some(player) = self.players.pop() {
            if !player.is_valid() {
                debug!("Purging stale {}", player.id());
                self.stats.purged_stale += 1;
                player.free();
                continue;
            }

            self.stats.reused += 1;
            return Some(player);
        }
        None
    }

    /// Take back a handle whose playback has ended.
    ///
    /// Freed instead of stored when the pool is already full.
    pub fn release(&mut self, player: PlaybackHandle) {
        self.stats.returned += 1;
        if self.players.len() >= self.capacity {
            debug!("Pool full ({}), discarding {}", self.capacity, player.id());
            self.stats.discarded_overflow += 1;
            player.free();
        } else {
            self.players.push(player);
        }
    }

    /// Number of idle handles stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check if no idle handle is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Maximum number of idle handles.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Activity counters. `created` is tracked by the factory and is zero here.
    #[must_use]
    pub const fn stats(&self) -> PoolStats {
        self.stats
    }

    /// IDs of stored handles in the order `acquire` would try them.
    #[must_use]
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().rev().map(PlaybackHandle::id).collect()
    }
}
