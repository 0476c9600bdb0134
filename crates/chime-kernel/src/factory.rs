//! Handle construction.
//!
//! Every handle leaves the factory with its completion callback wired to
//! the pool it belongs to, so a finished handle finds its own way home.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::PlaybackEngine;
use crate::handle::{FinishedCallback, PlaybackHandle};
use crate::pool::HandlePool;

/// Fabricates handles for a pool.
#[derive(Debug)]
pub struct HandleFactory {
    pool: Weak<Mutex<HandlePool>>,
    created: AtomicU64,
}

impl HandleFactory {
    /// Create a factory returning its handles to `pool`.
    #[must_use]
    pub fn new(pool: &Arc<Mutex<HandlePool>>) -> Self {
        Self {
            pool: Arc::downgrade(pool),
            created: AtomicU64::new(0),
        }
    }

    /// Make a fresh idle handle with a voice from `engine`.
    ///
    /// On completion the handle is released into the pool; if the pool is
    /// gone it is freed.
    pub fn create(&self, engine: &dyn PlaybackEngine) -> PlaybackHandle {
        let pool = Weak::clone(&self.pool);
        let on_finished: FinishedCallback = Arc::new(move |player: PlaybackHandle| {
            match pool.upgrade() {
                Some(pool) => pool.lock().release(player),
                None => player.free(),
            }
        });

        let player = PlaybackHandle::new(engine.create_voice(), on_finished);
        self.created.fetch_add(1, Ordering::Relaxed);
        debug!("Created {}", player.id());
        player
    }

    /// Number of handles fabricated so far.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleState;
    use crate::headless::HeadlessEngine;
    use crate::stream::AudioStream;
    use std::time::Duration;

    fn blip() -> AudioStream {
        AudioStream::from_samples(vec![0.0; 100], 1, 1_000)
    }

    #[test]
    fn test_created_handle_is_fresh() {
        let pool = Arc::new(Mutex::new(HandlePool::new(4)));
        let factory = HandleFactory::new(&pool);
        let engine = HeadlessEngine::default();

        let handle = factory.create(&engine);
        assert_eq!(handle.state(), HandleState::Idle);
        assert!(handle.is_valid());
        assert!(!handle.is_attached());
        assert!(handle.stream().is_none());
        assert_eq!(factory.created(), 1);
        assert_eq!(engine.voices_created(), 1);
    }

    #[test]
    fn test_completion_returns_to_pool() {
        let pool = Arc::new(Mutex::new(HandlePool::new(4)));
        let factory = HandleFactory::new(&pool);
        let engine = HeadlessEngine::default();

        let mut handle = factory.create(&engine);
        let id = handle.id();
        handle.set_stream(Some(blip()));
        handle.start();
        assert!(!handle.poll_finished());

        engine.advance(Duration::from_millis(100));
        assert!(handle.poll_finished());
        handle.finish();

        assert_eq!(pool.lock().ids(), vec![id]);
    }

    #[test]
    fn test_completion_after_pool_dropped_frees_handle() {
        let pool = Arc::new(Mutex::new(HandlePool::new(4)));
        let factory = HandleFactory::new(&pool);
        let engine = HeadlessEngine::default();

        let mut handle = factory.create(&engine);
        handle.set_stream(Some(blip()));
        handle.start();
        drop(pool);

        engine.advance(Duration::from_secs(1));
        assert!(handle.poll_finished());
        assert_eq!(engine.voices_stopped(), 0);
        handle.finish();
        assert_eq!(engine.voices_stopped(), 1);
    }
}
