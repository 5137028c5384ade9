//! Persisted application config: the KeyUUID and the app version that
//! created it.
//!
//! Stored as JSON (`app.config`) next to the secrets file:
//!
//! ```json
//! { "keyUUID": "1b4e28ba-2fa1-11d2-883f-0016d3cca427", "appVersion": "1.0.0" }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{LockboxError, Result};
use crate::vault::format;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Names the key file; never a secret itself.
    #[serde(rename = "keyUUID")]
    pub key_uuid: String,

    #[serde(rename = "appVersion", default)]
    pub app_version: String,
}

impl AppConfig {
    /// A fresh config with a random v4 KeyUUID.
    pub fn generate(app_version: &str) -> Self {
        Self {
            key_uuid: Uuid::new_v4().to_string(),
            app_version: app_version.to_string(),
        }
    }

    /// Load the config at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = format::read_document(path)?;
        if config.key_uuid.trim().is_empty() {
            return Err(LockboxError::Config(format!(
                "{} has an empty keyUUID",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Load the config at `path`, or generate and save a new one when it
    /// is missing.
    ///
    /// An existing file that cannot be read is an error.  Replacing it
    /// would bind a new key and orphan every stored secret.
    pub fn load_or_init(path: &Path, app_version: &str) -> Result<Self> {
        if path.exists() {
            return Self::load(path).map_err(|e| {
                warn!(path = %path.display(), error = %e, "app config unreadable");
                LockboxError::Config(format!(
                    "{} is unreadable ({e}); restore it from a backup or move it aside to start over with a new key",
                    path.display()
                ))
            });
        }

        let config = Self::generate(app_version);
        config.save(path)?;
        info!(path = %path.display(), "created app config");
        Ok(config)
    }

    /// Write the config (owner-only permissions), creating the parent
    /// directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| LockboxError::io_at(parent, e))?;
            }
        }
        format::write_document(path, self)
    }
}
