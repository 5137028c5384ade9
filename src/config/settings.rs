use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::encryption::SUPPORTED_KEY_LENGTHS;
use crate::errors::{LockboxError, Result};

/// File name of the secrets document.
pub const SECRETS_FILE_NAME: &str = "secrets.json";

/// File name of the app config holding the KeyUUID.
pub const APP_CONFIG_FILE_NAME: &str = "app.config";

/// Which environment Lockbox runs in.  Decides where files live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Test,
    Prod,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = LockboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "test" | "integration-test" | "e2e-test" => Ok(Self::Test),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(LockboxError::Config(format!(
                "unknown environment '{other}' (expected dev, test or prod)"
            ))),
        }
    }
}

/// Project-level configuration, loaded from `.lockbox.toml`.
///
/// Every field has a sensible default so Lockbox works out-of-the-box
/// without any config file at all.  Environment variables
/// (`LOCKBOX_ENV`, `LOCKBOX_SECRETS_FILE`, `LOCKBOX_KEY_SIZE`,
/// `LOCKBOX_TEST_DATA_DIR`, `LOCKBOX_APP_USER`) override the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// dev, test or prod.
    #[serde(default)]
    pub environment: Environment,

    /// Directory name used under the OS config dir in prod.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Recorded in the secrets document and on each new version.
    #[serde(default = "default_app_user")]
    pub app_user: String,

    /// Encryption key length in bytes for newly generated keys.
    #[serde(default = "default_key_size")]
    pub key_size: usize,

    /// Explicit secrets file path; overrides environment-based lookup.
    #[serde(default)]
    pub secrets_file: Option<PathBuf>,

    /// Root for secrets and keys in the test environment.
    #[serde(default)]
    pub test_data_dir: Option<PathBuf>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_app_name() -> String {
    "Lockbox".to_string()
}

fn default_app_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "default".to_string())
}

fn default_key_size() -> usize {
    32 // AES-256
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            app_name: default_app_name(),
            app_user: default_app_user(),
            key_size: default_key_size(),
            secrets_file: None,
            test_data_dir: None,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".lockbox.toml";

    /// Load settings from `<project_dir>/.lockbox.toml`, then apply
    /// `LOCKBOX_*` environment overrides.
    ///
    /// If the file does not exist, defaults are used.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut settings = Self::load_file(project_dir)?;
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load only the TOML file, without environment overrides.
    pub fn load_file(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| LockboxError::io_at(&config_path, e))?;

        toml::from_str(&contents).map_err(|e| {
            LockboxError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// `load`).  Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(env) = var("LOCKBOX_ENV") {
            self.environment = env.parse()?;
        }
        if let Some(path) = var("LOCKBOX_SECRETS_FILE") {
            self.secrets_file = Some(PathBuf::from(path));
        }
        if let Some(size) = var("LOCKBOX_KEY_SIZE") {
            self.key_size = size.trim().parse().map_err(|_| {
                LockboxError::Config(format!("LOCKBOX_KEY_SIZE '{size}' is not a number"))
            })?;
        }
        if let Some(dir) = var("LOCKBOX_TEST_DATA_DIR") {
            self.test_data_dir = Some(PathBuf::from(dir));
        }
        if let Some(user) = var("LOCKBOX_APP_USER") {
            self.app_user = user;
        }
        Ok(())
    }

    /// Reject values the crypto layer cannot use.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_KEY_LENGTHS.contains(&self.key_size) {
            return Err(LockboxError::Config(format!(
                "key_size must be 16, 24 or 32 bytes (got {})",
                self.key_size
            )));
        }
        if self.app_name.trim().is_empty() {
            return Err(LockboxError::Config("app_name cannot be empty".into()));
        }
        Ok(())
    }

    /// Resolve the secrets file path.
    ///
    /// - explicit `secrets_file` (relative paths resolve against `project_dir`)
    /// - test with `test_data_dir`: `<test_data_dir>/secrets.json`
    /// - dev (and test without a data dir): `<project_dir>/secrets.json`
    /// - prod: `<OS config dir>/<app_name>/secrets.json`
    pub fn secrets_file_path(&self, project_dir: &Path) -> Result<PathBuf> {
        if let Some(explicit) = &self.secrets_file {
            return Ok(project_dir.join(explicit));
        }

        match (self.environment, &self.test_data_dir) {
            (Environment::Test, Some(dir)) => Ok(project_dir.join(dir).join(SECRETS_FILE_NAME)),
            (Environment::Dev | Environment::Test, _) => Ok(project_dir.join(SECRETS_FILE_NAME)),
            (Environment::Prod, _) => Ok(self.os_app_dir()?.join(SECRETS_FILE_NAME)),
        }
    }

    /// Resolve the directory encryption keys are kept in.
    ///
    /// - test with `test_data_dir`: `<test_data_dir>/keys`
    /// - dev (and test without a data dir): `<project_dir>/keys`
    /// - prod: `<OS config dir>/<app_name>`
    pub fn key_dir(&self, project_dir: &Path) -> Result<PathBuf> {
        match (self.environment, &self.test_data_dir) {
            (Environment::Test, Some(dir)) => Ok(project_dir.join(dir).join("keys")),
            (Environment::Dev | Environment::Test, _) => Ok(project_dir.join("keys")),
            (Environment::Prod, _) => self.os_app_dir(),
        }
    }

    /// The app config lives next to the secrets file.
    pub fn app_config_path(&self, project_dir: &Path) -> Result<PathBuf> {
        let secrets = self.secrets_file_path(project_dir)?;
        let dir = secrets.parent().unwrap_or(project_dir);
        Ok(dir.join(APP_CONFIG_FILE_NAME))
    }

    fn os_app_dir(&self) -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| {
            LockboxError::Config("cannot determine the OS config directory".into())
        })?;
        Ok(base.join(&self.app_name))
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.environment, Environment::Dev);
        assert_eq!(s.app_name, "Lockbox");
        assert_eq!(s.key_size, 32);
        assert!(s.secrets_file.is_none());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn load_file_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load_file(tmp.path()).unwrap();
        assert_eq!(settings.environment, Environment::Dev);
    }

    #[test]
    fn load_file_parses_toml() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
environment = "prod"
app_name = "MyVault"
app_user = "alice"
key_size = 16
secrets_file = "data/store.json"
"#;
        fs::write(tmp.path().join(".lockbox.toml"), config).unwrap();

        let settings = Settings::load_file(tmp.path()).unwrap();
        assert_eq!(settings.environment, Environment::Prod);
        assert_eq!(settings.app_name, "MyVault");
        assert_eq!(settings.app_user, "alice");
        assert_eq!(settings.key_size, 16);
        assert_eq!(settings.secrets_file, Some(PathBuf::from("data/store.json")));
    }

    #[test]
    fn load_file_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".lockbox.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load_file(tmp.path()).is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut s = Settings::default();
        s.apply_overrides(lookup(&[
            ("LOCKBOX_ENV", "production"),
            ("LOCKBOX_KEY_SIZE", "24"),
            ("LOCKBOX_APP_USER", "bob"),
            ("LOCKBOX_SECRETS_FILE", ""),
        ]))
        .unwrap();

        assert_eq!(s.environment, Environment::Prod);
        assert_eq!(s.key_size, 24);
        assert_eq!(s.app_user, "bob");
        assert!(s.secrets_file.is_none(), "empty override is ignored");
    }

    #[test]
    fn bad_overrides_are_config_errors() {
        let mut s = Settings::default();
        assert!(s.apply_overrides(lookup(&[("LOCKBOX_ENV", "staging")])).is_err());
        assert!(s
            .apply_overrides(lookup(&[("LOCKBOX_KEY_SIZE", "big")]))
            .is_err());
    }

    #[test]
    fn validate_rejects_unusable_key_size() {
        let s = Settings {
            key_size: 20,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn dev_paths_live_in_project_dir() {
        let s = Settings::default();
        let project = Path::new("/work");
        assert_eq!(
            s.secrets_file_path(project).unwrap(),
            PathBuf::from("/work/secrets.json")
        );
        assert_eq!(s.key_dir(project).unwrap(), PathBuf::from("/work/keys"));
        assert_eq!(
            s.app_config_path(project).unwrap(),
            PathBuf::from("/work/app.config")
        );
    }

    #[test]
    fn test_paths_use_test_data_dir() {
        let s = Settings {
            environment: Environment::Test,
            test_data_dir: Some(PathBuf::from("/tmp/lockbox-test")),
            ..Settings::default()
        };
        let project = Path::new("/work");
        assert_eq!(
            s.secrets_file_path(project).unwrap(),
            PathBuf::from("/tmp/lockbox-test/secrets.json")
        );
        assert_eq!(
            s.key_dir(project).unwrap(),
            PathBuf::from("/tmp/lockbox-test/keys")
        );
    }

    #[test]
    fn explicit_secrets_file_wins() {
        let s = Settings {
            environment: Environment::Prod,
            secrets_file: Some(PathBuf::from("custom/s.json")),
            ..Settings::default()
        };
        let project = Path::new("/work");
        assert_eq!(
            s.secrets_file_path(project).unwrap(),
            PathBuf::from("/work/custom/s.json")
        );
        assert_eq!(
            s.app_config_path(project).unwrap(),
            PathBuf::from("/work/custom/app.config")
        );
    }

    #[test]
    fn environment_aliases() {
        assert_eq!("development".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("e2e-test".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
    }
}
