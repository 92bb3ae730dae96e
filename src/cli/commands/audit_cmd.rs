//! `envcrypt audit`: display the audit log.
//!
//! Usage:
//!   envcrypt audit               # show last 50 entries
//!   envcrypt audit --last 20     # show last 20

use crate::cli::output;
use crate::cli::{Cli, VaultContext};
use crate::errors::Result;

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize) -> Result<()> {
    let ctx = VaultContext::open(cli)?;

    let Some(db_path) = ctx.auditor.db_path() else {
        output::info("Audit logging is disabled.");
        return Ok(());
    };

    show(db_path, last)
}

#[cfg(feature = "audit-log")]
fn show(db_path: &std::path::Path, last: usize) -> Result<()> {
    use crate::audit::AuditLog;

    if !db_path.exists() {
        output::info("No audit entries found.");
        return Ok(());
    }

    let entries = AuditLog::open(db_path)?.recent(last)?;
    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);
    Ok(())
}

#[cfg(not(feature = "audit-log"))]
fn show(_db_path: &std::path::Path, _last: usize) -> Result<()> {
    Err(crate::errors::EnvCryptError::AuditError(
        "audit log support not compiled in; rebuild with `--features audit-log`".into(),
    ))
}

/// Print audit entries in a formatted table.
#[cfg(feature = "audit-log")]
pub fn print_audit_table(entries: &[crate::audit::AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Action", "Environment", "Key", "Result"]);

    for entry in entries {
        let result = if entry.success {
            style("ok").green().to_string()
        } else {
            style(entry.error.as_deref().unwrap_or("failed")).red().to_string()
        };

        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_action(&entry.action),
            entry.environment.clone(),
            entry.key.clone().unwrap_or_else(|| "-".into()),
            result,
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize action names for display.
#[cfg_attr(not(feature = "audit-log"), allow(dead_code))]
fn colorize_action(action: &str) -> String {
    use console::style;

    match action {
        "set" | "import" => style(action).blue().to_string(),
        "remove" => style(action).red().to_string(),
        "change-password" | "create-shares" | "recover" => style(action).yellow().to_string(),
        "export" | "run" => style(action).cyan().to_string(),
        _ => action.to_string(),
    }
}
