//! `lockbox audit`: display the audit log.
//!
//! Usage:
//!   lockbox audit               # show last 50 entries
//!   lockbox audit --last 20     # show last 20
//!   lockbox audit --since 7d    # entries from last 7 days

use chrono::{DateTime, Utc};

use crate::cli::Cli;
use crate::errors::{LockboxError, Result};

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    use crate::audit::AuditLog;
    use crate::cli::{output, Context};

    let ctx = Context::resolve(cli)?;
    let audit = AuditLog::open(ctx.data_dir())
        .ok_or_else(|| LockboxError::Audit("failed to open audit database".into()))?;

    let since_dt = since.map(parse_duration).transpose()?;
    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

#[cfg(not(feature = "audit-log"))]
pub fn execute(_cli: &Cli, _last: usize, since: Option<&str>) -> Result<()> {
    // Still validate the flag so typos are reported consistently.
    since.map(parse_duration).transpose()?;
    Err(LockboxError::Audit(
        "audit log support not compiled (rebuild with the `audit-log` feature)".into(),
    ))
}

/// Parse a human-friendly duration like "7d", "24h" or "30m" into the
/// point in time that far back from now.
fn parse_duration(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || {
        LockboxError::CommandFailed(format!(
            "invalid duration '{input}' (use a format like 7d, 24h or 30m)"
        ))
    };

    let unit = input.chars().last().ok_or_else(invalid)?;
    let num_str = &input[..input.len() - unit.len_utf8()];
    let num: i64 = num_str.parse().map_err(|_| invalid())?;

    let duration = match unit {
        'd' => chrono::Duration::days(num),
        'h' => chrono::Duration::hours(num),
        'm' => chrono::Duration::minutes(num),
        _ => return Err(invalid()),
    };

    Ok(Utc::now() - duration)
}

#[cfg(feature = "audit-log")]
fn print_audit_table(entries: &[crate::audit::AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Env", "User", "Secret", "Details"]);

    for entry in entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            entry.environment.clone(),
            entry.user.clone(),
            entry.secret_name.clone().unwrap_or_else(|| "-".into()),
            entry.details.clone().unwrap_or_else(|| "-".into()),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

#[cfg(feature = "audit-log")]
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" | "add" => style(op).green().to_string(),
        "update" => style(op).blue().to_string(),
        "delete" => style(op).red().to_string(),
        "revert" => style(op).yellow().to_string(),
        "migrate" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        let days = Utc::now() - parse_duration("7d").unwrap();
        assert!((days.num_days() - 7).abs() <= 1);

        let hours = Utc::now() - parse_duration("24h").unwrap();
        assert!((hours.num_hours() - 24).abs() <= 1);

        let minutes = Utc::now() - parse_duration("30m").unwrap();
        assert!((minutes.num_minutes() - 30).abs() <= 1);
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("7x").is_err());
        assert!(parse_duration("d").is_err());
        assert!(parse_duration("").is_err());
    }

    #[cfg(feature = "audit-log")]
    #[test]
    fn colorize_keeps_operation_text() {
        console::set_colors_enabled(false);
        assert_eq!(colorize_operation("revert"), "revert");
        assert_eq!(colorize_operation("unknown"), "unknown");
    }
}
