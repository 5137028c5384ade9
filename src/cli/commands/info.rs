//! `lockbox info`: store metadata, resolved paths and key fingerprint.

use crate::cli::output;
use crate::cli::{open_store, Cli, Context};
use crate::errors::Result;

/// Execute the `info` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let opened = open_store(&ctx)?;
    let stats = opened.service.stats()?;

    let key_manager = ctx.key_manager()?;
    let key = opened.service.key();

    let last_updated = stats
        .last_updated
        .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());

    output::print_fields(&[
        ("Environment", ctx.settings.environment.to_string()),
        ("App version", stats.app_version),
        ("App user", stats.app_user),
        ("Secrets", stats.secret_count.to_string()),
        ("Versions", stats.total_versions.to_string()),
        ("Last updated", last_updated),
        ("Secrets file", ctx.secrets_path.display().to_string()),
        ("App config", ctx.app_config_path()?.display().to_string()),
        (
            "Key file",
            key_manager
                .key_path(&opened.app_config.key_uuid)
                .display()
                .to_string(),
        ),
        ("Key size", format!("{} bytes", key.len())),
        ("Key fingerprint", key.fingerprint()),
    ]);

    Ok(())
}
