//! `lockbox update`: append a new version to an existing secret.

use crate::cli::output;
use crate::cli::{open_store, read_value, Cli, Context};
use crate::errors::Result;

/// Execute the `update` command.
pub fn execute(cli: &Cli, name: &str, value: Option<&str>) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let mut opened = open_store(&ctx)?;

    // Fail on unknown names before asking for a value.
    opened.service.get_secret(name)?;

    let secret_value = read_value(name, value)?;
    let version = opened.service.update_secret(name, &secret_value)?;

    crate::audit::log_audit(&ctx, "update", Some(name), Some(&format!("v{version}")));
    output::success(&format!("Secret '{name}' updated to v{version}"));

    Ok(())
}
