// SSHE — Password Codec
//
// Reversible transform between a node's plaintext password and the hex
// cipher text persisted in node.yaml.
//
// Scheme "aes":
//   1. key = MD5(secret_key), 16 bytes → AES-128
//   2. iv  = the same 16 bytes
//   3. PKCS#7 padding, CBC mode, lowercase hex output
//
// The IV is derived from the secret, not random: the same password under the
// same secret always encrypts to the same cipher text. Stores written by
// earlier releases depend on this, so it is kept as a known limitation.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use zeroize::Zeroizing;

use super::CipherError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

// ─── Constants ───────────────────────────────────────────────────────────────

/// AES block size in bytes. Also the key and IV length for AES-128.
pub const BLOCK_SIZE: usize = 16;

/// Identifier of the AES-128-CBC scheme in the config's `password_encode`.
pub const AES_SCHEME: &str = "aes";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over password encoding schemes, selected by the
/// `password_encode` config field.
pub trait PasswordCodec {
    /// The scheme identifier as written in the config file.
    fn scheme(&self) -> &'static str;

    /// Encrypt a plaintext password into its persisted string form.
    fn encrypt(&self, plaintext: &[u8], secret: &str) -> Result<String, CipherError>;

    /// Decrypt a persisted cipher text back into the plaintext password.
    fn decrypt(&self, cipher_text: &str, secret: &str) -> Result<Zeroizing<String>, CipherError>;
}

/// Look up the codec for a config scheme identifier.
pub fn codec_for(scheme: &str) -> Result<Box<dyn PasswordCodec>, CipherError> {
    match scheme {
        AES_SCHEME => Ok(Box::new(AesCodec)),
        other => Err(CipherError::UnsupportedScheme(other.to_string())),
    }
}

// ─── AES-128-CBC ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct AesCodec;

impl AesCodec {
    /// Key material shared by key and IV: MD5 of the secret string.
    fn derive_key(secret: &str) -> Zeroizing<[u8; BLOCK_SIZE]> {
        let digest = Md5::digest(secret.as_bytes());
        let mut key = Zeroizing::new([0u8; BLOCK_SIZE]);
        key.copy_from_slice(&digest);
        key
    }
}

impl PasswordCodec for AesCodec {
    fn scheme(&self) -> &'static str {
        AES_SCHEME
    }

    fn encrypt(&self, plaintext: &[u8], secret: &str) -> Result<String, CipherError> {
        let key = Self::derive_key(secret);
        let encryptor = Aes128CbcEnc::new_from_slices(&key[..], &key[..])
            .map_err(|e| CipherError::Key(e.to_string()))?;

        let cipher_text = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        Ok(hex::encode(cipher_text))
    }

    fn decrypt(&self, cipher_text: &str, secret: &str) -> Result<Zeroizing<String>, CipherError> {
        let raw = hex::decode(cipher_text)?;
        if raw.is_empty() || raw.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::InvalidLength(raw.len(), BLOCK_SIZE));
        }

        let key = Self::derive_key(secret);
        let decryptor = Aes128CbcDec::new_from_slices(&key[..], &key[..])
            .map_err(|e| CipherError::Key(e.to_string()))?;

        let plain = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&raw)
            .map_err(|_| CipherError::InvalidPadding)?;

        String::from_utf8(plain)
            .map(Zeroizing::new)
            .map_err(|_| CipherError::NotUtf8)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
