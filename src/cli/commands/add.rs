//! `lockbox add`: create a new secret at version 1.

use crate::cli::output;
use crate::cli::{open_store, read_value, Cli, Context};
use crate::errors::{LockboxError, Result};
use crate::vault::service::validate_secret_name;
use crate::vault::SecretType;

/// Execute the `add` command.
pub fn execute(cli: &Cli, name: &str, value: Option<&str>, secret_type: SecretType) -> Result<()> {
    // Reject bad names before prompting for a value.
    validate_secret_name(name)?;

    let ctx = Context::resolve(cli)?;
    let mut opened = open_store(&ctx)?;

    // Check before prompting so the user doesn't type a value for nothing.
    if opened.service.get_secret(name).is_ok() {
        output::tip(&format!("Run `lockbox update {name}` to store a new version."));
        return Err(LockboxError::SecretAlreadyExists(name.to_string()));
    }

    let secret_value = read_value(name, value)?;
    opened
        .service
        .save_new_secret_with_type(name, &secret_value, secret_type)?;

    crate::audit::log_audit(&ctx, "add", Some(name), Some(secret_type.as_str()));

    output::success(&format!(
        "Secret '{}' added as {} v1 ({} total)",
        name,
        secret_type,
        opened.service.secret_count()?
    ));

    Ok(())
}
