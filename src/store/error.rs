// SSHE — Store error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read nodes file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write nodes file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode nodes file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to encode nodes file: {0}")]
    Encode(#[from] serde_yaml::Error),
}
