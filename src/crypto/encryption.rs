//! AES-GCM authenticated encryption of secret values.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  The whole buffer is then base64
//! encoded so it can live inside the JSON secrets document as a string.
//!
//! Layout of the decoded token:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! The key length picks the cipher: 16 bytes for AES-128-GCM, 24 for
//! AES-192-GCM, 32 for AES-256-GCM.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::aes::Aes192;
use aes_gcm::{AeadCore, Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::CryptoEngine;
use crate::errors::{LockboxError, Result};

/// Size of the AES-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Key lengths accepted by `encrypt`/`decrypt`.
pub const SUPPORTED_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// Stateless AES-GCM engine.  Holds no key material of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmEngine;

impl CryptoEngine for AesGcmEngine {
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<String> {
        encrypt(plaintext, key)
    }

    fn decrypt(&self, token: &str, key: &[u8]) -> Result<Vec<u8>> {
        decrypt(token, key)
    }
}

/// Encrypt `plaintext` under `key` and return a base64 token.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<String> {
    let sealed = match key.len() {
        16 => seal::<Aes128Gcm>(key, plaintext)?,
        24 => seal::<Aes192Gcm>(key, plaintext)?,
        32 => seal::<Aes256Gcm>(key, plaintext)?,
        other => return Err(invalid_key_length(other)),
    };
    Ok(BASE64.encode(sealed))
}

/// Decrypt a token produced by `encrypt`.
///
/// Any failure after the key length check (bad base64, truncated token,
/// wrong key, flipped bit) is reported as `DecryptionFailed`.
pub fn decrypt(token: &str, key: &[u8]) -> Result<Vec<u8>> {
    if !SUPPORTED_KEY_LENGTHS.contains(&key.len()) {
        return Err(invalid_key_length(key.len()));
    }

    let data = BASE64
        .decode(token.trim())
        .map_err(|_| LockboxError::DecryptionFailed)?;

    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(LockboxError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);

    match key.len() {
        16 => open::<Aes128Gcm>(key, nonce_bytes, ciphertext),
        24 => open::<Aes192Gcm>(key, nonce_bytes, ciphertext),
        _ => open::<Aes256Gcm>(key, nonce_bytes, ciphertext),
    }
}

fn seal<C>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key)
        .map_err(|e| LockboxError::EncryptionFailed(format!("invalid key: {e}")))?;

    let nonce = C::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| LockboxError::EncryptionFailed(format!("encryption error: {e}")))?;

    // Prepend the nonce so the token is self-describing.
    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn open<C>(key: &[u8], nonce_bytes: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key).map_err(|_| LockboxError::DecryptionFailed)?;
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| LockboxError::DecryptionFailed)
}

fn invalid_key_length(len: usize) -> LockboxError {
    LockboxError::Validation(format!(
        "encryption key must be 16, 24 or 32 bytes, got {len}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_base64_of_nonce_ciphertext_and_tag() {
        let key = [0x11u8; 32];
        let token = encrypt(b"abc", &key).unwrap();
        let raw = BASE64.decode(&token).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn all_supported_key_sizes_roundtrip() {
        for len in SUPPORTED_KEY_LENGTHS {
            let key = vec![0x5Au8; len];
            let token = encrypt(b"sized", &key).unwrap();
            assert_eq!(decrypt(&token, &key).unwrap(), b"sized");
        }
    }

    #[test]
    fn unsupported_key_size_is_validation_error() {
        let key = [0u8; 20];
        assert!(matches!(
            encrypt(b"x", &key),
            Err(LockboxError::Validation(_))
        ));
        assert!(matches!(
            decrypt("AAAA", &key),
            Err(LockboxError::Validation(_))
        ));
    }

    #[test]
    fn key_of_different_size_cannot_decrypt() {
        let token = encrypt(b"x", &[1u8; 16]).unwrap();
        assert!(matches!(
            decrypt(&token, &[1u8; 32]),
            Err(LockboxError::DecryptionFailed)
        ));
    }

    #[test]
    fn garbage_token_fails_closed() {
        let key = [3u8; 32];
        assert!(matches!(
            decrypt("not base64 at all!", &key),
            Err(LockboxError::DecryptionFailed)
        ));
        assert!(matches!(
            decrypt("AAAA", &key),
            Err(LockboxError::DecryptionFailed)
        ));
    }
}
