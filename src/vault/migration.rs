//! Upgrade of legacy flat secrets files to the versioned format.
//!
//! The legacy document keeps one flat record per secret version:
//!
//! ```json
//! { "appVersion": "...", "appUser": "...", "lastUpdated": "...",
//!   "secrets": [
//!     { "secretName": "A", "secretValueEnc": "...", "type": "key_value",
//!       "version": 1, "updatedAt": "...", "updatedBy": "..." }
//!   ] }
//! ```
//!
//! Migration groups those records by name into `Secret`/`SecretVersion`,
//! moves the original to `<file>.backup` and writes the new document in
//! its place.  If the write fails the backup is moved back.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::format;
use super::secret::{null_as_empty, Secret, SecretType, SecretVersion, SecretsFile};
use crate::errors::{LockboxError, Result};

/// One flat record of the legacy format.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LegacySecret {
    pub secret_name: String,
    pub secret_value_enc: String,
    #[serde(rename = "type", default)]
    pub secret_type: SecretType,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// The legacy top-level document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySecretsFile {
    pub app_version: String,
    pub app_user: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_empty")]
    pub secrets: Vec<LegacySecret>,
}

/// What `migrate_to_new_format` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing to migrate: the file does not exist.
    NoFile,
    /// The file is already in the versioned format.
    AlreadyCurrent,
    /// The file was rewritten; the original lives at `backup_path`.
    Migrated {
        secrets: usize,
        versions: usize,
        backup_path: PathBuf,
    },
}

/// Path of the backup written next to `path`.
pub fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Detect a legacy file at `path` and upgrade it in place.
///
/// - Missing file: no-op.
/// - Current format (or an empty `secrets` array): no-op.
/// - Neither format: `Migration` error, file untouched.
pub fn migrate_to_new_format(path: &Path) -> Result<MigrationOutcome> {
    if !path.exists() {
        debug!(path = %path.display(), "no secrets file, nothing to migrate");
        return Ok(MigrationOutcome::NoFile);
    }

    let data = fs::read(path).map_err(|e| LockboxError::io_at(path, e))?;

    let legacy = match format::parse_document::<LegacySecretsFile>(path, &data) {
        Ok(legacy) if !legacy.secrets.is_empty() => legacy,
        Ok(_) => {
            debug!(path = %path.display(), "empty secrets list, treating as current format");
            return Ok(MigrationOutcome::AlreadyCurrent);
        }
        Err(legacy_err) => {
            return match format::parse_document::<SecretsFile>(path, &data) {
                Ok(_) => {
                    debug!(path = %path.display(), "file already in versioned format");
                    Ok(MigrationOutcome::AlreadyCurrent)
                }
                Err(current_err) => Err(LockboxError::Migration(format!(
                    "unrecognized document shape: {legacy_err}; {current_err}"
                ))),
            };
        }
    };

    let converted = convert_legacy(legacy);
    let secrets = converted.secrets.len();
    let versions = converted.total_versions();

    let backup_path = backup_path_for(path);
    fs::rename(path, &backup_path).map_err(|e| LockboxError::io_at(&backup_path, e))?;

    if let Err(e) = format::write_document(path, &converted) {
        warn!(path = %path.display(), error = %e, "writing migrated file failed, restoring backup");
        if let Err(restore_err) = fs::rename(&backup_path, path) {
            warn!(
                backup = %backup_path.display(),
                error = %restore_err,
                "could not restore backup"
            );
        }
        return Err(e);
    }

    info!(
        path = %path.display(),
        backup = %backup_path.display(),
        secrets,
        versions,
        "migrated legacy secrets file"
    );

    Ok(MigrationOutcome::Migrated {
        secrets,
        versions,
        backup_path,
    })
}

/// Group flat records into versioned secrets.
///
/// Output secrets are ordered by name and each chain by version number.
/// `current_version` and the secret type come from the record with the
/// highest version.  Top-level metadata is carried over unchanged.
pub fn convert_legacy(legacy: LegacySecretsFile) -> SecretsFile {
    let mut groups: BTreeMap<String, Vec<LegacySecret>> = BTreeMap::new();
    for record in legacy.secrets {
        groups
            .entry(record.secret_name.clone())
            .or_default()
            .push(record);
    }

    let secrets = groups
        .into_iter()
        .map(|(secret_name, mut records)| {
            records.sort_by_key(|r| r.version);

            // Sorted ascending, so the last record holds the max version.
            let (current_version, secret_type) = records
                .last()
                .map(|r| (r.version, r.secret_type))
                .unwrap_or_default();

            let versions = records
                .into_iter()
                .map(|r| SecretVersion {
                    encrypted_value: r.secret_value_enc,
                    version: r.version,
                    updated_at: r.updated_at,
                    updated_by: r.updated_by.filter(|u| !u.is_empty()),
                })
                .collect();

            Secret {
                secret_name,
                secret_type,
                current_version,
                versions,
            }
        })
        .collect();

    SecretsFile {
        app_version: legacy.app_version,
        app_user: legacy.app_user,
        last_updated: legacy.last_updated,
        secrets,
    }
}
