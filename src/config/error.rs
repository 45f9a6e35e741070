// SSHE — Config error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot determine the home directory; set SSHE_HOME")]
    HomeNotFound,

    #[error("Failed to create config directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode config file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to encode config file: {0}")]
    Encode(#[from] serde_yaml::Error),
}
