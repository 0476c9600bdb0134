//! Playback configuration.
//!
//! Holds the pool capacity, the default output bus and the bus layout.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ChimeResult, ConfigError};

/// Configuration file name.
pub const CONFIG_FILE: &str = "chime.toml";

/// Maximum number of idle players kept for reuse.
pub const MAX_POOLED_PLAYERS: usize = 64;

/// Name of the bus every sound falls back to.
pub const MASTER_BUS_NAME: &str = "Master";

/// Lowest accepted bus gain, in decibels.
pub const MIN_VOLUME_DB: f32 = -80.0;

/// Highest accepted bus gain, in decibels.
pub const MAX_VOLUME_DB: f32 = 24.0;

/// A named output bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus name, matched exactly
    pub name: String,
    /// Gain offset in decibels
    pub volume_db: f32,
    /// Silence everything routed to this bus
    pub mute: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            volume_db: 0.0,
            mute: false,
        }
    }
}

impl BusConfig {
    /// Create a bus with the given name and gain.
    #[must_use]
    pub fn new(name: impl Into<String>, volume_db: f32) -> Self {
        Self {
            name: name.into(),
            volume_db,
            mute: false,
        }
    }
}

/// Playback configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChimeConfig {
    /// Idle players kept for reuse; extra returned players are freed
    pub max_pooled_players: usize,
    /// Bus used when a play request names none
    pub default_bus: String,
    /// Gain of the master bus in decibels
    pub master_volume_db: f32,
    /// Additional buses besides master
    pub buses: Vec<BusConfig>,
}

impl Default for ChimeConfig {
    fn default() -> Self {
        Self {
            max_pooled_players: MAX_POOLED_PLAYERS,
            default_bus: MASTER_BUS_NAME.to_string(),
            master_volume_db: 0.0,
            buses: Vec::new(),
        }
    }
}

impl ChimeConfig {
    /// Set the pool capacity.
    #[must_use]
    pub const fn with_max_pooled_players(mut self, max: usize) -> Self {
        self.max_pooled_players = max;
        self
    }

    /// Set the default bus.
    #[must_use]
    pub fn with_default_bus(mut self, bus: impl Into<String>) -> Self {
        self.default_bus = bus.into();
        self
    }

    /// Add a bus.
    #[must_use]
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.buses.push(bus);
        self
    }

    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let mut contents = String::new();
        match fs::File::open(path).and_then(|mut file| file.read_to_string(&mut contents)) {
            Ok(_) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse config file: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                Self::default()
            },
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Save configuration to the default file location.
    pub fn save(&self) -> ChimeResult<()> {
        self.save_to(Self::config_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> ChimeResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(ConfigError::from)?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    fn config_path() -> PathBuf {
        if let Some(config_dir) = dirs_config_path() {
            config_dir.join("chime").join(CONFIG_FILE)
        } else {
            PathBuf::from(CONFIG_FILE)
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        if self.default_bus.trim().is_empty() {
            warn!("Empty default bus, using {MASTER_BUS_NAME}");
            self.default_bus = MASTER_BUS_NAME.to_string();
        }

        self.master_volume_db = self.master_volume_db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB);

        // Master is implicit and unnamed buses can never be addressed
        self.buses
            .retain(|bus| !bus.name.is_empty() && bus.name != MASTER_BUS_NAME);
        for bus in &mut self.buses {
            bus.volume_db = bus.volume_db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB);
        }

        let mut seen = std::collections::HashSet::new();
        self.buses.retain(|bus| {
            let first = seen.insert(bus.name.clone());
            if !first {
                warn!("Duplicate bus '{}' ignored", bus.name);
            }
            first
        });
    }
}

/// Get platform-specific config directory.
fn dirs_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Application Support"))
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ChimeConfig::default();
        assert_eq!(config.max_pooled_players, 64);
        assert_eq!(config.default_bus, "Master");
        assert!(config.buses.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = ChimeConfig::default()
            .with_max_pooled_players(8)
            .with_default_bus("Sfx")
            .with_bus(BusConfig::new("Sfx", -6.0));

        assert_eq!(config.max_pooled_players, 8);
        assert_eq!(config.default_bus, "Sfx");
        assert_eq!(config.buses.len(), 1);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ChimeConfig::default()
            .with_default_bus("  ")
            .with_bus(BusConfig::new("Sfx", 200.0))
            .with_bus(BusConfig::new("Sfx", 0.0))
            .with_bus(BusConfig::new("Master", 0.0))
            .with_bus(BusConfig::new("", 0.0));
        config.master_volume_db = -500.0;

        config.validate();

        assert_eq!(config.default_bus, MASTER_BUS_NAME);
        assert_eq!(config.buses.len(), 1);
        assert!((config.buses[0].volume_db - MAX_VOLUME_DB).abs() < f32::EPSILON);
        assert!((config.master_volume_db - MIN_VOLUME_DB).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_parse_partial() {
        let config = ChimeConfig::parse(
            r#"
            max_pooled_players = 4

            [[buses]]
            name = "Ui"
            mute = true
            "#,
        )
        .expect("valid config");

        assert_eq!(config.max_pooled_players, 4);
        assert_eq!(config.default_bus, "Master");
        assert_eq!(config.buses[0].name, "Ui");
        assert!(config.buses[0].mute);
        assert!(config.buses[0].volume_db.abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_parse_rejects_garbage() {
        assert!(ChimeConfig::parse("max_pooled_players = \"lots\"").is_err());
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("chime.toml");

        let config = ChimeConfig::default()
            .with_max_pooled_players(16)
            .with_bus(BusConfig::new("Voice", -3.0));

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = ChimeConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = ChimeConfig::load_from("/nonexistent/path/chime.toml");
        assert_eq!(config, ChimeConfig::default());
    }

    #[test]
    fn test_config_load_invalid_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("chime.toml");
        fs::write(&config_path, "this is = = not toml").expect("write");

        let config = ChimeConfig::load_from(&config_path);
        assert_eq!(config, ChimeConfig::default());
    }
}
