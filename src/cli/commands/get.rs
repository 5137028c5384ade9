//! `lockbox get`: decrypt and print (or copy) a secret's value.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_store, Cli, Context};
use crate::errors::{LockboxError, Result};

/// Execute the `get` command.
pub fn execute(cli: &Cli, name: &str, version: Option<u32>, copy: bool) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let opened = open_store(&ctx)?;

    let secret = opened.service.get_secret(name)?;
    let value = Zeroizing::new(match version {
        Some(v) => opened.service.get_secret_value_by_version(&secret, v)?,
        None => opened.service.get_secret_value(&secret)?,
    });
    let shown = version.unwrap_or(secret.current_version);

    if copy {
        copy_to_clipboard(&value)?;
        output::success(&format!("Copied '{name}' v{shown} to the clipboard"));
    } else {
        println!("{}", value.as_str());
    }

    Ok(())
}

fn copy_to_clipboard(value: &str) -> Result<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| LockboxError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(value.to_string())
        .map_err(|e| LockboxError::Clipboard(e.to_string()))
}
