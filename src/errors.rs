use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in Lockbox.
#[derive(Debug, Error)]
pub enum LockboxError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong key or tampered data")]
    DecryptionFailed,

    // --- Key and input validation ---
    #[error("Validation failed: {0}")]
    Validation(String),

    // --- Store errors ---
    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Version {version} of secret '{name}' not found")]
    VersionNotFound { name: String, version: u32 },

    #[error("Secret '{0}' already exists (use `update` to add a version)")]
    SecretAlreadyExists(String),

    #[error("Failed to parse {0}")]
    Parse(String),

    // --- Migration errors ---
    #[error("Migration failed: {0}")]
    Migration(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error at {path}: {source}")]
    IoAt {
        path: PathBuf,
        source: std::io::Error,
    },

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    Audit(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

impl LockboxError {
    /// Attach the path an IO error happened at.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type alias for Lockbox results.
pub type Result<T> = std::result::Result<T, LockboxError>;
