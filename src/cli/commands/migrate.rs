//! `lockbox migrate`: convert a legacy flat secrets file in place.
//!
//! Other commands migrate automatically when they open the store; this
//! runs the upgrade on its own, optionally on an arbitrary file.

use std::path::Path;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;
use crate::vault::{migrate_to_new_format, MigrationOutcome};

/// Execute the `migrate` command.
pub fn execute(cli: &Cli, file: Option<&Path>) -> Result<()> {
    let ctx = Context::resolve(cli)?;
    let path = match file {
        Some(f) => ctx.project_dir.join(f),
        None => ctx.secrets_path.clone(),
    };

    let outcome = migrate_to_new_format(&path)?;
    report_outcome(&outcome, &path);

    match &outcome {
        MigrationOutcome::NoFile => {
            output::info(&format!("No secrets file at {}", path.display()));
        }
        MigrationOutcome::AlreadyCurrent => {
            output::info(&format!(
                "{} is already in the versioned format",
                path.display()
            ));
        }
        MigrationOutcome::Migrated {
            secrets, versions, ..
        } => {
            crate::audit::log_audit(
                &ctx,
                "migrate",
                None,
                Some(&format!("{secrets} secret(s), {versions} version(s)")),
            );
        }
    }

    Ok(())
}

/// Tell the user about a migration that actually rewrote `path`.
/// No-op outcomes print nothing.
pub fn report_outcome(outcome: &MigrationOutcome, path: &Path) {
    if let MigrationOutcome::Migrated {
        secrets,
        versions,
        backup_path,
    } = outcome
    {
        output::success(&format!(
            "Migrated {} to the versioned format: {secrets} secret(s), {versions} version(s)",
            path.display()
        ));
        output::info(&format!("Original kept at {}", backup_path.display()));
    }
}
