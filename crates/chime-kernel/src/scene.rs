//! Live environment for playback handles.
//!
//! A [`SceneTree`] is what keeps handles alive and updating while they
//! play. Active handles are its children; `process` is called once per
//! frame and hands every finished child to its completion callback.
//!
//! Handles are bound to the tree's current [`SceneLifetime`]. Reloading the
//! tree replaces the lifetime, which invalidates every handle attached
//! before the reload, including idle ones sitting in a pool.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::{EngineRef, PlaybackEngine};
use crate::handle::PlaybackHandle;

/// Liveness token for one incarnation of a scene.
///
/// Handles hold a weak reference; once the scene drops its token they
/// report themselves invalid.
#[derive(Debug)]
pub struct SceneLifetime {
    generation: u64,
}

impl SceneLifetime {
    pub(crate) const fn new(generation: u64) -> Self {
        Self { generation }
    }

    /// Which incarnation of the scene this token belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// The running application's attachment context for handles.
pub struct SceneTree {
    engine: EngineRef,
    lifetime: Arc<SceneLifetime>,
    children: Vec<PlaybackHandle>,
}

impl fmt::Debug for SceneTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneTree")
            .field("generation", &self.lifetime.generation)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

impl SceneTree {
    /// Create a tree whose handles play through `engine`.
    #[must_use]
    pub fn new(engine: EngineRef) -> Self {
        Self {
            engine,
            lifetime: Arc::new(SceneLifetime::new(0)),
            children: Vec::new(),
        }
    }

    /// The playback engine voices are created from.
    #[must_use]
    pub fn engine(&self) -> &dyn PlaybackEngine {
        self.engine.as_ref()
    }

    /// Current scene incarnation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lifetime.generation
    }

    /// Bind `player` to this scene unless it is already attached somewhere.
    ///
    /// Returns true if the handle was attached by this call.
    pub fn attach(&self, player: &mut PlaybackHandle) -> bool {
        let attached = player.attach_to(&self.lifetime);
        if attached {
            debug!("Attached {} to scene {}", player.id(), self.generation());
        }
        attached
    }

    /// Check if `player` can play here: unattached, or attached to this
    /// incarnation of this scene. Its voice then comes from this engine.
    #[must_use]
    pub fn can_host(&self, player: &PlaybackHandle) -> bool {
        !player.is_attached() || player.is_attached_to(&self.lifetime)
    }

    /// Take ownership of a playing handle until its clip ends.
    pub fn adopt(&mut self, player: PlaybackHandle) {
        self.children.push(player);
    }

    /// Per-frame update: complete every child whose clip has ended.
    ///
    /// Returns the number of handles completed.
    pub fn process(&mut self) -> usize {
        if self.children.is_empty() {
            return 0;
        }

        let (finished, playing): (Vec<_>, Vec<_>) = std::mem::take(&mut self.children)
            .into_iter()
            .partition(PlaybackHandle::poll_finished);
        self.children = playing;

        let count = finished.len();
        for player in finished {
            player.finish();
        }
        count
    }

    /// Tear the scene down.
    ///
    /// Playing children are stopped and freed, and every handle attached
    /// to the previous incarnation becomes invalid.
    pub fn reload(&mut self) {
        let stopped = self.children.len();
        for player in self.children.drain(..) {
            player.free();
        }

        let generation = self.lifetime.generation + 1;
        self.lifetime = Arc::new(SceneLifetime::new(generation));
        info!("Scene reloaded (generation {generation}, {stopped} sounds stopped)");
    }

    /// Number of playing handles.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.children.len()
    }

    /// Playing handles, oldest first.
    pub fn children(&self) -> impl Iterator<Item = &PlaybackHandle> {
        self.children.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::HandleFactory;
    use crate::headless::HeadlessEngine;
    use crate::pool::HandlePool;
    use crate::stream::AudioStream;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct Fixture {
        engine: Arc<HeadlessEngine>,
        tree: SceneTree,
        pool: Arc<Mutex<HandlePool>>,
        factory: HandleFactory,
    }

    fn fixture() -> Fixture {
        let engine = Arc::new(HeadlessEngine::default());
        let tree = SceneTree::new(engine.clone());
        let pool = Arc::new(Mutex::new(HandlePool::new(8)));
        let factory = HandleFactory::new(&pool);
        Fixture {
            engine,
            tree,
            pool,
            factory,
        }
    }

    fn clip(millis: usize) -> AudioStream {
        AudioStream::from_samples(vec![0.0; millis], 1, 1_000)
    }

    fn start(fx: &mut Fixture, stream: AudioStream) -> chime_common::PlayerId {
        let mut player = fx.factory.create(fx.tree.engine());
        player.set_stream(Some(stream));
        fx.tree.attach(&mut player);
        player.start();
        let id = player.id();
        fx.tree.adopt(player);
        id
    }

    #[test]
    fn test_process_completes_finished_children() {
        let mut fx = fixture();
        let short = start(&mut fx, clip(100));
        let long = start(&mut fx, clip(300));
        assert_eq!(fx.tree.active_count(), 2);

        fx.engine.advance(Duration::from_millis(150));
        assert_eq!(fx.tree.process(), 1);
        assert_eq!(fx.tree.children().map(PlaybackHandle::id).collect::<Vec<_>>(), vec![long]);
        assert_eq!(fx.pool.lock().ids(), vec![short]);

        fx.engine.advance(Duration::from_millis(200));
        assert_eq!(fx.tree.process(), 1);
        assert_eq!(fx.pool.lock().ids(), vec![long, short]);
    }

    #[test]
    fn test_completion_fires_once() {
        let mut fx = fixture();
        start(&mut fx, clip(10));
        fx.engine.advance(Duration::from_millis(50));

        assert_eq!(fx.tree.process(), 1);
        assert_eq!(fx.tree.process(), 0);
        assert_eq!(fx.pool.lock().stats().returned, 1);
    }

    #[test]
    fn test_attach_is_idempotent() {
        let fx = fixture();
        let mut player = fx.factory.create(fx.tree.engine());
        assert!(fx.tree.attach(&mut player));
        assert!(!fx.tree.attach(&mut player));
    }

    #[test]
    fn test_reload_invalidates_pooled_handles() {
        let mut fx = fixture();
        start(&mut fx, clip(10));
        fx.engine.advance(Duration::from_millis(10));
        fx.tree.process();
        assert_eq!(fx.pool.lock().len(), 1);

        fx.tree.reload();
        assert_eq!(fx.tree.generation(), 1);

        let mut pool = fx.pool.lock();
        assert!(pool.acquire().is_none());
        assert_eq!(pool.stats().purged_stale, 1);
    }

    #[test]
    fn test_reload_stops_playing_children() {
        let mut fx = fixture();
        start(&mut fx, clip(1_000));
        fx.tree.reload();

        assert_eq!(fx.tree.active_count(), 0);
        fx.engine.advance(Duration::from_secs(2));
        assert_eq!(fx.tree.process(), 0);
        assert!(fx.pool.lock().is_empty());
    }
}
