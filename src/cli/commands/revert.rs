//! `lockbox revert`: point a secret back at an earlier version.

use crate::cli::output;
use crate::cli::{open_store, Cli, Context};
use crate::errors::Result;

/// Execute the `revert` command.
///
/// Refuses unknown version numbers unless `unchecked` is set.
pub fn execute(cli: &Cli, name: &str, version: u32, unchecked: bool) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let mut opened = open_store(&ctx)?;

    if unchecked {
        opened.service.revert_to_version(name, version)?;
    } else {
        opened.service.revert_to_version_checked(name, version)?;
    }

    crate::audit::log_audit(&ctx, "revert", Some(name), Some(&format!("v{version}")));
    output::success(&format!("Secret '{name}' now points at v{version}"));

    Ok(())
}
