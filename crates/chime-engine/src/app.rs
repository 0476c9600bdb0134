//! Playback loop for the command-line player.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chime_common::ChimeConfig;
use clap::Parser;
use chime_kernel::prelude::*;
use parking_lot::Mutex;
use tracing::{info, warn};

/// Target frame time for the update loop.
const FRAME_TIME: Duration = Duration::from_millis(16);

/// Delay between successive clips.
const STAGGER: Duration = Duration::from_millis(250);

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "chime")]
#[command(about = "Play sound files fire-and-forget through the handle pool")]
#[command(version)]
pub struct Args {
    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep time without an output device
    #[arg(long)]
    pub headless: bool,

    /// Files to play, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Drives the scene clock; only headless playback needs it.
enum Clock {
    /// Keeps the output stream open.
    Device(#[allow(dead_code)] AudioDevice),
    Headless(Arc<HeadlessEngine>),
}

impl Clock {
    fn tick(&self, delta: Duration) {
        if let Self::Headless(engine) = self {
            engine.advance(delta);
        }
    }
}

/// Play every file once and wait for all of them to finish.
pub fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ChimeConfig::load_from(path),
        None => ChimeConfig::load(),
    };
    SoundManager::init_global(&config);
    let manager = SoundManager::global();

    let buses = BusLayout::from_config(&config);
    let (clock, engine): (Clock, EngineRef) = if args.headless {
        let engine = Arc::new(HeadlessEngine::new(buses));
        (Clock::Headless(Arc::clone(&engine)), engine as EngineRef)
    } else {
        let device = AudioDevice::new()?;
        let engine = Arc::new(RodioEngine::new(&device, buses));
        (Clock::Device(device), engine as EngineRef)
    };

    let tree = Arc::new(Mutex::new(SceneTree::new(engine)));
    manager.set_current_tree(&tree);

    let sounds: Vec<AudioStream> = args
        .files
        .iter()
        .filter_map(|path| match AudioStream::load(path) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                None
            },
        })
        .collect();
    info!("Playing {} of {} files", sounds.len(), args.files.len());

    let started = Instant::now();
    let mut next = 0;
    let mut last_frame = Instant::now();
    loop {
        let now = Instant::now();
        clock.tick(now - last_frame);
        last_frame = now;

        while next < sounds.len() && started.elapsed() >= STAGGER * next as u32 {
            sounds[next].play();
            next += 1;
        }

        let active = {
            let mut tree = tree.lock();
            tree.process();
            tree.active_count()
        };
        if next == sounds.len() && active == 0 {
            break;
        }

        std::thread::sleep(FRAME_TIME);
    }

    let stats = manager.stats();
    info!(
        "Done: {} handles created, {} reused, {} pooled",
        stats.created,
        stats.reused,
        manager.pooled_count()
    );
    Ok(())
}
