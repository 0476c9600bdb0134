//! # Chime Engine
//!
//! Command-line front end for Chime: plays sound files fire-and-forget
//! through the pooled sound manager.
//!
//! ```text
//! chime [--config PATH] [--headless] FILE...
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("chime=info".parse()?))
        .init();

    info!("Chime starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = app::Args::parse();
    app::run(&args)?;

    info!("Chime shutdown complete");
    Ok(())
}
