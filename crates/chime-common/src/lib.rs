//! # Chime Common
//!
//! Common types, utilities, and shared abstractions for Chime.
//!
//! This crate provides foundational types used across all Chime crates:
//! - ID types (PlayerId, StreamId)
//! - Common error types
//! - Configuration file handling
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_generation() {
        let id1 = PlayerId::new();
        let id2 = PlayerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_default_config_matches_constants() {
        let config = ChimeConfig::default();
        assert_eq!(config.max_pooled_players, MAX_POOLED_PLAYERS);
        assert_eq!(config.default_bus, MASTER_BUS_NAME);
    }
}
