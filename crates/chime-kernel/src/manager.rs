//! Fire-and-forget sound playback.
//!
//! [`SoundManager`] ties the pool and factory together. A play request
//! takes a handle from the pool (or makes one), configures it, attaches it
//! to the live scene and starts it. Nothing is returned to manage: when the
//! clip ends the handle goes back to the pool on its own.
//!
//! ```ignore
//! use chime_kernel::prelude::*;
//!
//! let tree = Arc::new(Mutex::new(SceneTree::new(engine)));
//! SoundManager::global().set_current_tree(&tree);
//!
//! let jump = AudioStream::load("sfx/jump.wav")?;
//! jump.play();
//! jump.play_configured(-6.0, 1.2, Some(&BusName::new("Sfx")));
//!
//! // Each frame
//! tree.lock().process();
//! ```

use std::sync::{Arc, OnceLock, Weak};

use chime_common::{ChimeConfig, PlayerId};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::bus::BusName;
use crate::factory::HandleFactory;
use crate::pool::{HandlePool, PoolStats};
use crate::scene::SceneTree;
use crate::stream::AudioStream;

static GLOBAL: OnceLock<SoundManager> = OnceLock::new();

/// Pooled one-shot playback.
#[derive(Debug)]
pub struct SoundManager {
    pool: Arc<Mutex<HandlePool>>,
    factory: HandleFactory,
    default_bus: BusName,
    current_tree: RwLock<Weak<Mutex<SceneTree>>>,
}

impl Default for SoundManager {
    fn default() -> Self {
        Self::new(&ChimeConfig::default())
    }
}

impl SoundManager {
    /// Create a manager with an empty pool.
    #[must_use]
    pub fn new(config: &ChimeConfig) -> Self {
        let pool = Arc::new(Mutex::new(HandlePool::from_config(config)));
        let factory = HandleFactory::new(&pool);
        Self {
            pool,
            factory,
            default_bus: BusName::new(&config.default_bus),
            current_tree: RwLock::new(Weak::new()),
        }
    }

    /// The process-wide manager, created with default settings on first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            debug!("Creating global sound manager");
            Self::default()
        })
    }

    /// Create the process-wide manager from `config`.
    ///
    /// Returns false if it already exists; the existing one is kept.
    pub fn init_global(config: &ChimeConfig) -> bool {
        let installed = GLOBAL.set(Self::new(config)).is_ok();
        if installed {
            debug!(
                "Global sound manager created (capacity {}, bus {})",
                config.max_pooled_players, config.default_bus
            );
        }
        installed
    }

    /// Make `tree` the scene used when no scene is passed explicitly.
    pub fn set_current_tree(&self, tree: &Arc<Mutex<SceneTree>>) {
        *self.current_tree.write() = Arc::downgrade(tree);
    }

    /// Forget the current scene.
    pub fn clear_current_tree(&self) {
        *self.current_tree.write() = Weak::new();
    }

    /// The current scene, if one is registered and still alive.
    #[must_use]
    pub fn current_tree(&self) -> Option<Arc<Mutex<SceneTree>>> {
        self.current_tree.read().upgrade()
    }

    /// Play a sound at default volume and pitch on the default bus.
    pub fn play(&self, sound: Option<&AudioStream>) {
        self.play_configured(sound, 0.0, 1.0, None);
    }

    /// Play a sound on the current scene.
    ///
    /// Does nothing if no scene is registered. Do not call this while
    /// holding the current scene's lock; use [`Self::play_sound`] instead.
    pub fn play_configured(
        &self,
        sound: Option<&AudioStream>,
        volume_db: f32,
        pitch_scale: f32,
        bus: Option<&BusName>,
    ) {
        let Some(tree) = self.current_tree() else {
            trace!("No current scene, dropping play request");
            return;
        };
        let mut tree = tree.lock();
        self.play_sound(&mut tree, sound, volume_db, pitch_scale, bus);
    }

    /// Play a sound on an explicit scene.
    ///
    /// An absent or empty sound is a no-op. A missing bus means the default
    /// bus. Returns the ID of the handle that was started.
    ///
    /// A handle keeps the voice and scene it was first played in. If the
    /// pool hands back one that belongs to another live scene, it is freed
    /// and a new handle is made from this scene's engine.
    pub fn play_sound(
        &self,
        tree: &mut SceneTree,
        sound: Option<&AudioStream>,
        volume_db: f32,
        pitch_scale: f32,
        bus: Option<&BusName>,
    ) -> Option<PlayerId> {
        let sound = sound.filter(|sound| !sound.is_empty())?;

        // The pool lock is released before the handle is touched.
        let pooled = self.pool.lock().acquire();
        let mut player = match pooled {
            Some(player) if tree.can_host(&player) => {
                trace!("Reusing {}", player.id());
                player
            },
            Some(player) => {
                debug!("{} belongs to another scene, replacing it", player.id());
                player.free();
                self.factory.create(tree.engine())
            },
            None => self.factory.create(tree.engine()),
        };

        player.set_stream(Some(sound.clone()));
        player.set_volume_db(volume_db);
        player.set_pitch_scale(pitch_scale);
        player.set_bus(bus.cloned().unwrap_or_else(|| self.default_bus.clone()));
        tree.attach(&mut player);
        player.start();

        let id = player.id();
        tree.adopt(player);
        Some(id)
    }

    /// Maximum number of idle handles kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.lock().capacity()
    }

    /// Number of idle handles waiting for reuse.
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.pool.lock().len()
    }

    /// Bus used when a request names none.
    #[must_use]
    pub fn default_bus(&self) -> &BusName {
        &self.default_bus
    }

    /// Pool activity counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.factory.created(),
            ..self.pool.lock().stats()
        }
    }
}

/// Play a sound through the global manager on the current scene.
pub trait PlaySoundExt {
    /// Play at default volume and pitch on the default bus.
    fn play(&self);

    /// Play with explicit parameters.
    fn play_configured(&self, volume_db: f32, pitch_scale: f32, bus: Option<&BusName>);
}

impl PlaySoundExt for AudioStream {
    fn play(&self) {
        SoundManager::global().play(Some(self));
    }

    fn play_configured(&self, volume_db: f32, pitch_scale: f32, bus: Option<&BusName>) {
        SoundManager::global().play_configured(Some(self), volume_db, pitch_scale, bus);
    }
}

impl PlaySoundExt for Option<AudioStream> {
    fn play(&self) {
        SoundManager::global().play(self.as_ref());
    }

    fn play_configured(&self, volume_db: f32, pitch_scale: f32, bus: Option<&BusName>) {
        SoundManager::global().play_configured(self.as_ref(), volume_db, pitch_scale, bus);
    }
}

/// Play a sound through the global manager on a specific scene.
///
/// For hosts that drive their own scene instead of registering a current one.
pub trait ScenePlayExt {
    /// Play `sound` on this scene.
    fn play_sound(
        &mut self,
        sound: Option<&AudioStream>,
        volume_db: f32,
        pitch_scale: f32,
        bus: Option<&BusName>,
    ) -> Option<PlayerId>;
}

impl ScenePlayExt for SceneTree {
    fn play_sound(
        &mut self,
        sound: Option<&AudioStream>,
        volume_db: f32,
        pitch_scale: f32,
        bus: Option<&BusName>,
    ) -> Option<PlayerId> {
        SoundManager::global().play_sound(self, sound, volume_db, pitch_scale, bus)
    }
}
