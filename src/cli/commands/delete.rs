//! `lockbox delete`: remove a secret and all its versions.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_store, Cli, Context};
use crate::errors::{LockboxError, Result};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let mut opened = open_store(&ctx)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let versions = opened
            .service
            .get_secret(name)
            .map_or(0, |s| s.versions.len());
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete secret '{name}' and its {versions} version(s)?"
            ))
            .default(false)
            .interact()
            .map_err(|e| LockboxError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    if opened.service.delete_secret(name)? {
        crate::audit::log_audit(&ctx, "delete", Some(name), None);
        output::success(&format!("Deleted secret '{name}'"));
    } else {
        output::info(&format!("No secret named '{name}'; nothing deleted."));
    }

    Ok(())
}
