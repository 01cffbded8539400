//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Top-level configuration must be a mapping")]
    NotAMapping,

    #[error("Unsupported mapping key: {0}")]
    UnsupportedKey(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
