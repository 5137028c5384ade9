//! Persistence of the whole secrets document.
//!
//! `SecretStore` is the capability the service depends on.  `FileStore`
//! backs it with a JSON file on disk; `MemoryStore` keeps the document
//! in memory for tests and embedding.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use super::format;
use super::secret::SecretsFile;
use crate::errors::Result;

/// Read/write access to the full secrets document.
///
/// Writes replace the whole document.  Implementations must either
/// replace everything or report failure.
pub trait SecretStore {
    /// Load the document.  A store that has never been written returns
    /// an empty document, not an error.
    fn read_secrets(&self) -> Result<SecretsFile>;

    /// Stamp `last_updated` and persist `data`, replacing prior content.
    fn write_secrets(&mut self, data: SecretsFile) -> Result<()>;
}

/// A secrets document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    app_version: String,
    app_user: String,
}

impl FileStore {
    /// `app_version` and `app_user` seed the empty document returned
    /// when the file does not exist yet.
    pub fn new(path: impl Into<PathBuf>, app_version: &str, app_user: &str) -> Self {
        Self {
            path: path.into(),
            app_version: app_version.to_string(),
            app_user: app_user.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the backing file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write an empty document if the file is absent.  Returns `true`
    /// if a file was created.
    pub fn ensure_exists(&mut self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        debug!(path = %self.path.display(), "secrets file not found, creating empty document");
        let empty = SecretsFile::empty(&self.app_version, &self.app_user);
        self.write_secrets(empty)?;
        Ok(true)
    }
}

impl SecretStore for FileStore {
    fn read_secrets(&self) -> Result<SecretsFile> {
        if !self.path.exists() {
            return Ok(SecretsFile::empty(&self.app_version, &self.app_user));
        }

        let data: SecretsFile = format::read_document(&self.path)?;
        debug!(
            path = %self.path.display(),
            secrets = data.secrets.len(),
            "secrets document loaded"
        );
        Ok(data)
    }

    fn write_secrets(&mut self, mut data: SecretsFile) -> Result<()> {
        data.last_updated = Some(Utc::now());
        format::write_document(&self.path, &data)
    }
}

/// In-memory `SecretStore`.  Starts empty; `document()` exposes what was
/// last written.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: SecretsFile,
    writes: usize,
}

impl MemoryStore {
    pub fn new(app_version: &str, app_user: &str) -> Self {
        Self {
            data: SecretsFile::empty(app_version, app_user),
            writes: 0,
        }
    }

    /// Seed the store with an existing document.
    pub fn with_document(data: SecretsFile) -> Self {
        Self { data, writes: 0 }
    }

    pub fn document(&self) -> &SecretsFile {
        &self.data
    }

    /// Number of successful `write_secrets` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SecretStore for MemoryStore {
    fn read_secrets(&self) -> Result<SecretsFile> {
        Ok(self.data.clone())
    }

    fn write_secrets(&mut self, mut data: SecretsFile) -> Result<()> {
        data.last_updated = Some(Utc::now());
        self.data = data;
        self.writes += 1;
        Ok(())
    }
}
