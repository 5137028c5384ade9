//! `lockbox list`: display all secrets in a table.

use crate::cli::output;
use crate::cli::{open_store, Cli, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let opened = open_store(&ctx)?;

    let secrets = opened.service.list_secrets()?;

    output::info(&format!(
        "{} environment: {} secret(s)",
        ctx.settings.environment,
        secrets.len()
    ));

    output::print_secrets_table(&secrets);

    Ok(())
}
