//! `lockbox init`: resolve paths, load or generate the key, upgrade a
//! legacy secrets file, and create an empty one if needed.

use crate::cli::commands::migrate::report_outcome;
use crate::cli::output;
use crate::cli::{open_store, Cli, Context};
use crate::crypto::KeyOrigin;
use crate::errors::Result;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let opened = open_store(&ctx)?;
    let key_manager = ctx.key_manager()?;
    let key_path = key_manager.key_path(&opened.app_config.key_uuid);

    // 1. Key: freshly generated keys need backing up.
    let key_detail = match opened.key_origin {
        KeyOrigin::Generated => {
            output::success(&format!(
                "Generated new encryption key at {}",
                key_path.display()
            ));
            output::warning("Back this key up. Secrets cannot be recovered without it.");
            "key generated"
        }
        KeyOrigin::Loaded => {
            output::info(&format!("Using existing key at {}", key_path.display()));
            "key loaded"
        }
    };

    // 2. Legacy upgrade, if one happened.
    report_outcome(&opened.migration, &ctx.secrets_path);

    // 3. Secrets file.
    if opened.created {
        output::success(&format!(
            "Created secrets file for '{}' at {}",
            ctx.settings.environment,
            ctx.secrets_path.display()
        ));
    } else {
        output::info(&format!(
            "Secrets file already exists at {} ({} secret(s))",
            ctx.secrets_path.display(),
            opened.service.secret_count()?
        ));
    }

    crate::audit::log_audit(&ctx, "init", None, Some(key_detail));

    output::tip("Run `lockbox add <NAME>` to add a secret.");
    output::tip("Run `lockbox list` to see all secrets.");

    Ok(())
}
