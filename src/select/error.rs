// SSHE — Selection error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("No data matching IP {ip} was found")]
    NotFound { ip: String },

    #[error("No data matching IP {ip} and username {username} was found")]
    Ambiguous { ip: String, username: String },

    #[error("The username {username} already exists for IP {ip}")]
    Duplicate { ip: String, username: String },

    #[error("Failed to read operator input: {0}")]
    Input(#[from] std::io::Error),
}
