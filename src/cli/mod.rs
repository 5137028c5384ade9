//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::{AppConfig, Settings};
use crate::crypto::{AesGcmEngine, KeyManager, KeyOrigin};
use crate::errors::{LockboxError, Result};
use crate::vault::{
    migrate_to_new_format, FileStore, MigrationOutcome, SecretType, VersionedSecretService,
};

/// Version written into new secrets documents and app configs.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lockbox CLI: local encrypted secret store with version history.
#[derive(Parser)]
#[command(
    name = "lockbox",
    about = "Encrypted secret store with version history",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Environment: dev, test or prod (overrides LOCKBOX_ENV and .lockbox.toml)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Path to the secrets file (overrides environment-based lookup)
    #[arg(long, global = true)]
    pub secrets_file: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create or load the encryption key and secrets file (migrates legacy files)
    Init,

    /// Add a new secret at version 1
    Add {
        /// Secret name (e.g. DATABASE_URL)
        name: String,
        /// Secret value (omit for stdin or interactive prompt)
        value: Option<String>,
        /// Secret type: key_value, json or other
        #[arg(short = 't', long = "type", default_value = "key_value")]
        secret_type: SecretType,
    },

    /// Store a new version of an existing secret
    Update {
        /// Secret name
        name: String,
        /// New value (omit for stdin or interactive prompt)
        value: Option<String>,
    },

    /// Print a secret's current (or a specific) value
    Get {
        /// Secret name
        name: String,
        /// Version number to read instead of the current one
        #[arg(long)]
        version: Option<u32>,
        /// Copy to the clipboard instead of printing
        #[arg(short, long)]
        copy: bool,
    },

    /// List all secrets
    List,

    /// Show every version of a secret, newest first
    History {
        /// Secret name
        name: String,
    },

    /// Make an earlier version current
    Revert {
        /// Secret name
        name: String,
        /// Version number to make current
        version: u32,
        /// Skip the check that the version exists
        #[arg(long)]
        unchecked: bool,
    },

    /// Delete a secret and all its versions
    Delete {
        /// Secret name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show store metadata, paths and key fingerprint
    Info,

    /// Convert a legacy flat secrets file to the versioned format
    Migrate {
        /// File to migrate (default: the resolved secrets file)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// View the audit log of store operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// The service type every command works with.
pub type Service = VersionedSecretService<AesGcmEngine, FileStore>;

/// Settings and resolved paths for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub project_dir: PathBuf,
    pub settings: Settings,
    pub secrets_path: PathBuf,
}

impl Context {
    /// Load settings from the working directory and apply CLI overrides.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let project_dir = std::env::current_dir()?;
        Self::resolve_in(cli, project_dir)
    }

    /// Same as `resolve`, rooted at `project_dir`.
    pub fn resolve_in(cli: &Cli, project_dir: PathBuf) -> Result<Self> {
        let mut settings = Settings::load(&project_dir)?;
        if let Some(env) = &cli.env {
            settings.environment = env.parse()?;
        }
        if let Some(path) = &cli.secrets_file {
            settings.secrets_file = Some(path.clone());
        }

        let secrets_path = settings.secrets_file_path(&project_dir)?;
        Ok(Self {
            project_dir,
            settings,
            secrets_path,
        })
    }

    /// Directory holding the secrets file, app config and audit log.
    pub fn data_dir(&self) -> &Path {
        self.secrets_path.parent().unwrap_or(self.project_dir.as_path())
    }

    pub fn app_config_path(&self) -> Result<PathBuf> {
        self.settings.app_config_path(&self.project_dir)
    }

    pub fn key_manager(&self) -> Result<KeyManager> {
        Ok(KeyManager::new(
            self.settings.key_dir(&self.project_dir)?,
            self.settings.key_size,
        ))
    }

    /// Create the data directory (owner-only) if it is missing.
    pub fn ensure_data_dir(&self) -> Result<()> {
        let dir = self.data_dir();
        if dir.exists() {
            return Ok(());
        }

        fs::create_dir_all(dir).map_err(|e| LockboxError::io_at(dir, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(dir, perms).map_err(|e| LockboxError::io_at(dir, e))?;
        }

        Ok(())
    }
}

/// A ready-to-use service plus what happened while opening it.
pub struct OpenedStore {
    pub service: Service,
    pub app_config: AppConfig,
    pub key_origin: KeyOrigin,
    pub migration: MigrationOutcome,
    /// `true` if an empty secrets file was written.
    pub created: bool,
}

/// Wire up everything a command needs:
///
/// 1. Ensure the data directory exists.
/// 2. Load (or create) `app.config` to get the KeyUUID.
/// 3. Load (or generate) the encryption key.
/// 4. Upgrade a legacy secrets file, if any.
/// 5. Create an empty secrets file if none exists.
pub fn open_store(ctx: &Context) -> Result<OpenedStore> {
    ctx.ensure_data_dir()?;

    let app_config = AppConfig::load_or_init(&ctx.app_config_path()?, APP_VERSION)?;
    let (key, key_origin) = ctx
        .key_manager()?
        .load_or_create_key_with_origin(&app_config.key_uuid)?;

    let migration = migrate_to_new_format(&ctx.secrets_path)?;

    let mut store = FileStore::new(&ctx.secrets_path, APP_VERSION, &ctx.settings.app_user);
    let created = store.ensure_exists()?;

    let service =
        VersionedSecretService::new(AesGcmEngine, store, key).with_user(&ctx.settings.app_user);

    Ok(OpenedStore {
        service,
        app_config,
        key_origin,
        migration,
        created,
    })
}

/// Get a secret value from one of three sources:
/// 1. The command-line argument (warns about shell history).
/// 2. Piped stdin (trailing newline trimmed).
/// 3. A hidden interactive prompt.
///
/// Returns `Zeroizing<String>` so the value is wiped from memory on drop.
pub fn read_value(name: &str, value: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = value {
        output::warning("Value provided on command line; it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\r', '\n']).to_string();
        return Ok(Zeroizing::new(trimmed));
    }

    let v = dialoguer::Password::new()
        .with_prompt(format!("Enter value for {name}"))
        .interact()
        .map_err(|e| LockboxError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(v))
}
