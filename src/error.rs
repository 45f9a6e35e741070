// SSHE — Top-level error types
//
// Aggregates errors from the cipher, store, selection, config and session
// modules into a single error enum for the command boundary.

use thiserror::Error;

/// Top-level error type for all SSHE operations.
#[derive(Debug, Error)]
pub enum SsheError {
    #[error("Invalid IP address: {0}")]
    Validation(String),

    #[error("Password cipher error: {0}")]
    Cipher(#[from] crate::cipher::CipherError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("{0}")]
    Select(#[from] crate::select::SelectError),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("SSH error: {0}")]
    Session(#[from] crate::session::SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SsheError>;
