//! Error types for Paddock

use thiserror::Error;

/// Result type alias using Paddock Error
pub type Result<T> = std::result::Result<T, Error>;

/// Paddock error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Bundle error: {0}")]
    Bundle(String),
}

impl Error {
    /// Build an `InvalidConfig` error for an environment variable that failed to parse
    pub fn invalid_env(var: &str, value: &str) -> Self {
        Error::InvalidConfig(format!("invalid {} environment variable: {}", var, value))
    }
}
