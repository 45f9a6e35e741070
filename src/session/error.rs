// SSHE — Session error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to connect to SSH server {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("SSH handshake with {addr} failed: {source}")]
    Handshake { addr: String, source: ssh2::Error },

    #[error("Authentication failed for {username}@{addr}")]
    Auth { username: String, addr: String },

    #[error("Failed to open SSH shell: {0}")]
    Channel(#[from] ssh2::Error),

    #[error("Terminal error: {0}")]
    Terminal(std::io::Error),

    #[error("Session exited with error: {0}")]
    Relay(std::io::Error),
}
