//! Cryptographic primitives for Lockbox.
//!
//! This module provides:
//! - AES-GCM encryption and decryption of secret values (`encryption`)
//! - Encryption key generation, persistence and loading (`keys`)

pub mod encryption;
pub mod keys;

use crate::errors::Result;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, KeyManager, ...};
pub use encryption::{decrypt, encrypt, AesGcmEngine};
pub use keys::{EncryptionKey, KeyManager, KeyOrigin, DEFAULT_KEY_SIZE};

/// Encrypt/decrypt capability used by the secret service.
///
/// Implementations hold no key material: the key is handed in on every
/// call, so one engine can serve any number of stores.
pub trait CryptoEngine {
    /// Encrypt `plaintext` under `key`, returning a self-describing token.
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<String>;

    /// Reverse `encrypt`.  Must fail with `DecryptionFailed` on a wrong
    /// key or a tampered token.
    fn decrypt(&self, token: &str, key: &[u8]) -> Result<Vec<u8>>;
}
