//! Error types for configuration loading.

use thiserror::Error;

/// Errors from loading or validating assembly configs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON config did not parse.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// Offending file.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A TOML config did not parse.
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        /// Offending file.
        path: String,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// A config parsed but holds unusable values.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
