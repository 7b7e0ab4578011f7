//! Unified error types for Vigil

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Vigil operations
#[derive(Error, Debug)]
pub enum Error {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Config errors
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    #[error("Invalid value '{value}' for {name}")]
    ConfigValue { name: String, value: String },

    // Sampling errors (fatal to the current cycle, no partial alerts)
    #[error("Failed to sample host metrics: {0}")]
    Sampling(String),

    // Monitor cycle errors
    #[error("Monitor cycle event '{event}' rejected in state '{state}'")]
    CycleTransition { event: String, state: String },
}

/// Result type alias for Vigil operations
pub type Result<T> = std::result::Result<T, Error>;
