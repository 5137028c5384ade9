//! `lockbox history`: list a secret's versions, newest first.

use crate::cli::output;
use crate::cli::{open_store, Cli, Context};
use crate::errors::Result;

/// Execute the `history` command.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let opened = open_store(&ctx)?;

    // Unknown names are an error here even though the history call
    // itself returns an empty list for them.
    let secret = opened.service.get_secret(name)?;
    let versions = opened.service.secret_history(name)?;

    output::print_history_table(name, secret.current_version, &versions);
    if secret.current().is_none() {
        output::warning(&format!(
            "Current version v{} does not exist; run `lockbox revert` to fix it.",
            secret.current_version
        ));
    }

    Ok(())
}
