// SSHE — Cipher Module
//
// Encrypts node passwords at rest. The key material is the config's
// `secret_key`; the scheme is chosen by its `password_encode` field.

mod codec;
mod error;

pub use codec::{codec_for, AesCodec, PasswordCodec, AES_SCHEME, BLOCK_SIZE};
pub use error::CipherError;
