//! Vault module: encrypted, versioned secret storage.
//!
//! This module provides:
//! - `Secret`, `SecretVersion` and `SecretsFile` types (`secret`)
//! - Atomic JSON document I/O (`format`)
//! - The `SecretStore` capability with file and in-memory backends (`store`)
//! - `VersionedSecretService` for creating, updating and reverting secrets (`service`)
//! - Legacy flat-file migration (`migration`)

pub mod format;
pub mod migration;
pub mod secret;
pub mod service;
pub mod store;

// Re-export the most commonly used items.
pub use migration::{migrate_to_new_format, MigrationOutcome};
pub use secret::{Secret, SecretType, SecretVersion, SecretsFile};
pub use service::{StoreStats, VersionedSecretService};
pub use store::{FileStore, MemoryStore, SecretStore};
