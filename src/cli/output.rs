//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{Secret, SecretVersion};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of secrets (Name, Type, Current, Versions, Updated).
pub fn print_secrets_table(secrets: &[Secret]) {
    if secrets.is_empty() {
        info("No secrets stored yet.");
        tip("Run `lockbox add <NAME>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Type", "Current", "Versions", "Updated"]);

    for s in secrets {
        let updated = s
            .last_modified()
            .map_or_else(|| "-".to_string(), |t| t.format(TIME_FORMAT).to_string());
        table.add_row(vec![
            s.secret_name.clone(),
            s.secret_type.to_string(),
            format!("v{}", s.current_version),
            s.versions.len().to_string(),
            updated,
        ]);
    }

    println!("{table}");
}

/// Print a secret's versions (already ordered), marking the current one.
pub fn print_history_table(name: &str, current_version: u32, versions: &[SecretVersion]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "Version", "Updated", "By"]);

    for v in versions {
        let marker = if v.version == current_version {
            style("*").green().bold().to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            marker,
            format!("v{}", v.version),
            v.updated_at.format(TIME_FORMAT).to_string(),
            v.updated_by.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!(
        "{}",
        style(format!("{name}: {} version(s)", versions.len())).bold()
    );
    println!("{table}");
}

/// Print `label: value` pairs, labels aligned.
pub fn print_fields(fields: &[(&str, String)]) {
    let width = fields.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (label, value) in fields {
        println!("  {:<width$}  {}", style(label).bold(), value, width = width);
    }
}
