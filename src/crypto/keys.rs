//! Encryption key lifecycle.
//!
//! The key is a random byte string generated once per KeyUUID and kept
//! in a dotfile named after that UUID (`<key_dir>/.<key_uuid>`), so the
//! file name alone says nothing about what it protects.
//!
//! The file is written with owner-only permissions on Unix.  The key is
//! never stored inside the secrets document.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::errors::{LockboxError, Result};

/// Default key length in bytes (AES-256).
pub const DEFAULT_KEY_SIZE: usize = 32;

/// Number of bytes of the SHA-256 digest shown as a fingerprint.
const FINGERPRINT_LEN: usize = 8;

/// Raw key material that is wiped from memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct EncryptionKey {
    bytes: Vec<u8>,
}

impl EncryptionKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to pass to a `CryptoEngine`).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short, non-reversible identifier for display.
    ///
    /// Base64 of the first bytes of SHA-256 over the key.
    pub fn fingerprint(&self) -> String {
        use base64::engine::general_purpose::STANDARD_NO_PAD as BASE64;
        use base64::Engine;

        let digest = Sha256::digest(&self.bytes);
        BASE64.encode(&digest[..FINGERPRINT_LEN])
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Whether `load_or_create_key_with_origin` generated a fresh key or
/// read an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    Generated,
    Loaded,
}

/// Resolves, loads, or generates the key bound to a KeyUUID.
#[derive(Debug, Clone)]
pub struct KeyManager {
    key_dir: PathBuf,
    key_size: usize,
}

impl KeyManager {
    /// `key_size` of zero falls back to `DEFAULT_KEY_SIZE`.
    pub fn new(key_dir: impl Into<PathBuf>, key_size: usize) -> Self {
        let key_size = if key_size == 0 {
            DEFAULT_KEY_SIZE
        } else {
            key_size
        };
        Self {
            key_dir: key_dir.into(),
            key_size,
        }
    }

    pub fn key_dir(&self) -> &Path {
        &self.key_dir
    }

    pub fn key_size(&self) -> usize {
        self.key_size
    }

    /// Full path of the key file for `key_uuid`.
    pub fn key_path(&self, key_uuid: &str) -> PathBuf {
        self.key_dir.join(format!(".{key_uuid}"))
    }

    /// Load the key for `key_uuid`, generating and persisting one first
    /// if none exists.
    pub fn load_or_create_key(&self, key_uuid: &str) -> Result<EncryptionKey> {
        self.load_or_create_key_with_origin(key_uuid)
            .map(|(key, _)| key)
    }

    /// Same as `load_or_create_key`, but also reports whether the key was
    /// generated by this call.
    pub fn load_or_create_key_with_origin(
        &self,
        key_uuid: &str,
    ) -> Result<(EncryptionKey, KeyOrigin)> {
        validate_key_uuid(key_uuid)?;
        self.ensure_key_dir()?;

        let path = self.key_path(key_uuid);

        if !path.exists() {
            match self.generate_key(&path)? {
                Some(key) => {
                    info!(path = %path.display(), size = self.key_size, "generated new encryption key");
                    return Ok((key, KeyOrigin::Generated));
                }
                None => debug!(path = %path.display(), "key file appeared concurrently, loading it"),
            }
        }

        let key = load_key(&path)?;
        debug!(path = %path.display(), "loaded encryption key");
        Ok((key, KeyOrigin::Loaded))
    }

    fn ensure_key_dir(&self) -> Result<()> {
        if self.key_dir.exists() {
            return Ok(());
        }

        fs::create_dir_all(&self.key_dir)
            .map_err(|e| LockboxError::io_at(&self.key_dir, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(&self.key_dir, perms)
                .map_err(|e| LockboxError::io_at(&self.key_dir, e))?;
        }

        Ok(())
    }

    /// Generate and persist a fresh key.  Returns `None` when another
    /// process created the key file first; that key must be used instead.
    fn generate_key(&self, path: &Path) -> Result<Option<EncryptionKey>> {
        let mut bytes = vec![0u8; self.key_size];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            LockboxError::EncryptionFailed(format!("system RNG unavailable: {e}"))
        })?;

        // Build the wrapper first so the bytes are wiped on every error path.
        let key = EncryptionKey::new(bytes);
        match write_key_file(path, key.as_bytes()) {
            Ok(()) => Ok(Some(key)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(LockboxError::io_at(path, e)),
        }
    }
}

/// Read a key file and reject empty key material.
fn load_key(path: &Path) -> Result<EncryptionKey> {
    let bytes = fs::read(path).map_err(|e| {
        LockboxError::Validation(format!(
            "failed to read encryption key at {}: {e}",
            path.display()
        ))
    })?;

    if bytes.is_empty() {
        return Err(LockboxError::Validation(format!(
            "encryption key at {} is empty",
            path.display()
        )));
    }

    Ok(EncryptionKey::new(bytes))
}

/// Create the key file owner-only from the start.  Never overwrites an
/// existing file.
fn write_key_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    #[cfg(unix)]
    let mut file = {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(path)?
    };

    #[cfg(not(unix))]
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;

    if let Err(e) = file.write_all(bytes).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// The UUID becomes a file name, so it must not be able to escape the
/// key directory.
fn validate_key_uuid(key_uuid: &str) -> Result<()> {
    if key_uuid.is_empty() {
        return Err(LockboxError::Validation("key UUID cannot be empty".into()));
    }
    if !key_uuid
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(LockboxError::Validation(format!(
            "key UUID '{key_uuid}' may only contain ASCII letters, digits, hyphens and underscores"
        )));
    }
    Ok(())
}
