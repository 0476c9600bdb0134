//! Error types for Chime.

use thiserror::Error;

/// Top-level error type for Chime operations.
#[derive(Debug, Error)]
pub enum ChimeError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type alias for Chime operations.
pub type ChimeResult<T> = Result<T, ChimeError>;
