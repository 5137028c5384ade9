//! Versioned secret operations.
//!
//! `VersionedSecretService` ties a `CryptoEngine`, a `SecretStore` and
//! the encryption key together.  Every mutating call is a full
//! read-modify-write of the secrets document:
//!
//! ```text
//! read_secrets() -> change one Secret -> write_secrets()
//! ```
//!
//! Mutations take `&mut self`, so one service instance can never
//! interleave two of them.  Two *processes* sharing a file can still
//! lose an update: both read the same snapshot and the second write
//! wins.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use zeroize::Zeroize;

use super::secret::{Secret, SecretType, SecretVersion, SecretsFile};
use super::store::SecretStore;
use crate::crypto::{CryptoEngine, EncryptionKey};
use crate::errors::{LockboxError, Result};

/// Maximum length of a secret name in bytes.
const MAX_NAME_LEN: usize = 256;

/// Store-level aggregates, all taken from a single read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub app_version: String,
    pub app_user: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub secret_count: usize,
    pub total_versions: usize,
}

/// Business-logic layer over an encrypted, versioned secrets document.
pub struct VersionedSecretService<C, S> {
    crypto: C,
    store: S,
    key: EncryptionKey,
    /// Written into `updatedBy` of every new version.
    user: Option<String>,
}

impl<C: CryptoEngine, S: SecretStore> VersionedSecretService<C, S> {
    pub fn new(crypto: C, store: S, key: EncryptionKey) -> Self {
        Self {
            crypto,
            store,
            key,
            user: None,
        }
    }

    /// Record `user` as the author of versions written from now on.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Borrow the underlying store (e.g. to inspect a `MemoryStore`).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The key this service encrypts with.
    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a `key_value` secret at version 1.
    ///
    /// Fails with `SecretAlreadyExists` if the name is taken.
    pub fn save_new_secret(&mut self, name: &str, value: &str) -> Result<()> {
        self.save_new_secret_with_type(name, value, SecretType::KeyValue)
    }

    /// Create a secret of the given type at version 1.
    pub fn save_new_secret_with_type(
        &mut self,
        name: &str,
        value: &str,
        secret_type: SecretType,
    ) -> Result<()> {
        validate_secret_name(name)?;

        let mut data = self.store.read_secrets()?;
        if data.contains(name) {
            return Err(LockboxError::SecretAlreadyExists(name.to_string()));
        }

        let first = self.seal_version(value, 1)?;
        data.secrets.push(Secret::new(name, secret_type, first));

        self.store.write_secrets(data)?;
        info!(secret = name, "secret created");
        Ok(())
    }

    /// Append a new version holding `value` and make it current.
    ///
    /// The new number is one past the highest number in the chain, which
    /// is `current_version + 1` unless the secret was reverted.  Numbers
    /// therefore stay unique and gap-free.  Fails with `SecretNotFound`
    /// if the secret does not exist.
    pub fn update_secret(&mut self, name: &str, value: &str) -> Result<u32> {
        let mut data = self.store.read_secrets()?;

        let latest = data
            .find(name)
            .map(Secret::latest_version_number)
            .ok_or_else(|| LockboxError::SecretNotFound(name.to_string()))?;
        let next = latest + 1;

        let version = self.seal_version(value, next)?;

        let secret = data
            .find_mut(name)
            .ok_or_else(|| LockboxError::SecretNotFound(name.to_string()))?;
        secret.versions.push(version);
        secret.current_version = next;

        self.store.write_secrets(data)?;
        info!(secret = name, version = next, "secret updated");
        Ok(next)
    }

    /// Remove a secret and its whole version chain.
    ///
    /// Idempotent: deleting an unknown name succeeds.  Returns whether a
    /// secret was actually removed.
    pub fn delete_secret(&mut self, name: &str) -> Result<bool> {
        let mut data = self.store.read_secrets()?;
        let removed = data.remove(name);

        // The document is rewritten either way so `lastUpdated` moves.
        self.store.write_secrets(data)?;

        if removed {
            info!(secret = name, "secret deleted");
        } else {
            debug!(secret = name, "delete of unknown secret ignored");
        }
        Ok(removed)
    }

    /// Point `current_version` at `version` without appending anything.
    ///
    /// The target number is **not** checked against the chain, so a
    /// later `get_secret_value` on a bad target fails with
    /// `SecretNotFound`.  Use `revert_to_version_checked` to reject
    /// unknown numbers up front.
    pub fn revert_to_version(&mut self, name: &str, version: u32) -> Result<()> {
        let mut data = self.store.read_secrets()?;
        let secret = data
            .find_mut(name)
            .ok_or_else(|| LockboxError::SecretNotFound(name.to_string()))?;
        secret.current_version = version;

        self.store.write_secrets(data)?;
        info!(secret = name, version, "secret reverted");
        Ok(())
    }

    /// Like `revert_to_version`, but fails with `VersionNotFound` when
    /// `version` is not part of the chain.
    pub fn revert_to_version_checked(&mut self, name: &str, version: u32) -> Result<()> {
        let secret = self.get_secret(name)?;
        if secret.version(version).is_none() {
            return Err(LockboxError::VersionNotFound {
                name: name.to_string(),
                version,
            });
        }
        self.revert_to_version(name, version)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Fetch a secret record (still encrypted).
    pub fn get_secret(&self, name: &str) -> Result<Secret> {
        self.store
            .read_secrets()?
            .find(name)
            .cloned()
            .ok_or_else(|| LockboxError::SecretNotFound(name.to_string()))
    }

    /// Decrypt the version `secret.current_version` points at.
    pub fn get_secret_value(&self, secret: &Secret) -> Result<String> {
        let current = secret
            .current()
            .ok_or_else(|| LockboxError::SecretNotFound(secret.secret_name.clone()))?;
        self.open_version(current)
    }

    /// Decrypt a specific version of `secret`.
    pub fn get_secret_value_by_version(&self, secret: &Secret, version: u32) -> Result<String> {
        let found = secret
            .version(version)
            .ok_or_else(|| LockboxError::VersionNotFound {
                name: secret.secret_name.clone(),
                version,
            })?;
        self.open_version(found)
    }

    /// All secrets, sorted by name.
    pub fn list_secrets(&self) -> Result<Vec<Secret>> {
        let mut secrets = self.store.read_secrets()?.secrets;
        secrets.sort_by(|a, b| a.secret_name.cmp(&b.secret_name));
        Ok(secrets)
    }

    /// Versions of `name`, newest first.  Unknown names yield an empty
    /// history.
    pub fn secret_history(&self, name: &str) -> Result<Vec<SecretVersion>> {
        Ok(self
            .store
            .read_secrets()?
            .find(name)
            .map(Secret::versions_sorted)
            .unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Aggregates (each re-reads the document)
    // ------------------------------------------------------------------

    pub fn secret_count(&self) -> Result<usize> {
        Ok(self.store.read_secrets()?.secrets.len())
    }

    /// Sum of version counts across every secret.
    pub fn total_versions(&self) -> Result<usize> {
        Ok(self.store.read_secrets()?.total_versions())
    }

    pub fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.store.read_secrets()?.last_updated)
    }

    pub fn app_version(&self) -> Result<String> {
        Ok(self.store.read_secrets()?.app_version)
    }

    pub fn app_user(&self) -> Result<String> {
        Ok(self.store.read_secrets()?.app_user)
    }

    /// All aggregates from one read of the document.
    pub fn stats(&self) -> Result<StoreStats> {
        let data: SecretsFile = self.store.read_secrets()?;
        Ok(StoreStats {
            secret_count: data.secrets.len(),
            total_versions: data.total_versions(),
            last_updated: data.last_updated,
            app_version: data.app_version,
            app_user: data.app_user,
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn seal_version(&self, value: &str, number: u32) -> Result<SecretVersion> {
        let encrypted_value = self.crypto.encrypt(value.as_bytes(), self.key.as_bytes())?;
        Ok(SecretVersion {
            encrypted_value,
            version: number,
            updated_at: Utc::now(),
            updated_by: self.user.clone(),
        })
    }

    fn open_version(&self, version: &SecretVersion) -> Result<String> {
        let plaintext = self
            .crypto
            .decrypt(&version.encrypted_value, self.key.as_bytes())?;

        // On error, zeroize the bytes inside the error before discarding.
        String::from_utf8(plaintext).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            LockboxError::Serialization("secret value is not valid UTF-8".to_string())
        })
    }
}

/// Validate that a secret name is usable.
///
/// Must be non-empty, at most 256 bytes, and free of control characters.
pub fn validate_secret_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LockboxError::Validation(
            "secret name cannot be empty".into(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(LockboxError::Validation(format!(
            "secret name cannot exceed {MAX_NAME_LEN} bytes"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(LockboxError::Validation(format!(
            "secret name {name:?} contains control characters"
        )));
    }
    Ok(())
}
