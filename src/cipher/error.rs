// SSHE — Cipher error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Unsupported password encoding scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Failed to create AES cipher: {0}")]
    Key(String),

    #[error("Failed to decode cipher text: {0}")]
    MalformedHex(#[from] hex::FromHexError),

    #[error("Invalid cipher text length: {0} bytes is not a positive multiple of {1}")]
    InvalidLength(usize, usize),

    #[error("Invalid padding: cipher text is corrupted or the secret key is wrong")]
    InvalidPadding,

    #[error("Decrypted password is not valid UTF-8; the secret key is probably wrong")]
    NotUtf8,
}
