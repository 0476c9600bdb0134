//! # Chime Kernel
//!
//! Fire-and-forget playback of short sounds.
//!
//! Callers hand over a clip plus volume, pitch and bus; the kernel finds or
//! makes a playback handle, starts it, and takes the handle back when the
//! clip ends. Nothing has to be kept around by the caller.
//!
//! ## Architecture
//!
//! - **Pool**: bounded LIFO store of idle handles. Handles whose scene was
//!   torn down while idle are purged lazily when the pool is next asked
//!   for one.
//! - **Factory**: builds handles with their completion callback already
//!   pointing at the pool.
//! - **Scene tree**: the live environment. Owns playing handles, polls
//!   them once per frame and fires completion for finished ones.
//! - **Engines**: [`RodioEngine`] plays through an output device,
//!   [`HeadlessEngine`] only keeps time.
//!
//! ## Threading
//!
//! All pool access goes through one mutex. Completion callbacks run on
//! whichever thread calls [`SceneTree::process`], normally the main loop.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod audio_backend;
pub mod bus;
pub mod engine;
pub mod factory;
pub mod handle;
pub mod headless;
pub mod manager;
pub mod player;
pub mod pool;
pub mod scene;
pub mod stream;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audio_backend::*;
    pub use crate::bus::*;
    pub use crate::engine::*;
    pub use crate::factory::*;
    pub use crate::handle::*;
    pub use crate::headless::*;
    pub use crate::manager::*;
    pub use crate::player::*;
    pub use crate::pool::*;
    pub use crate::scene::*;
    pub use crate::stream::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chime_common::ChimeConfig;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_play_then_reuse_end_to_end() {
        let manager = SoundManager::new(&ChimeConfig::default());
        let engine = Arc::new(HeadlessEngine::default());
        let mut tree = SceneTree::new(engine.clone());

        let clip_a = AudioStream::from_samples(vec![0.0; 200], 1, 1_000).named("a");
        let clip_b = AudioStream::from_samples(vec![0.0; 100], 1, 1_000).named("b");

        let first = manager.play_sound(&mut tree, Some(&clip_a), 0.0, 1.0, None);
        engine.advance(Duration::from_millis(200));
        tree.process();
        assert_eq!(manager.pooled_count(), 1);

        let second = manager.play_sound(&mut tree, Some(&clip_b), 0.0, 1.0, None);
        assert_eq!(first, second);
        assert_eq!(
            tree.children().next().and_then(|h| h.stream()).and_then(AudioStream::name),
            Some("b")
        );
    }
}
