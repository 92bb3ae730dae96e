//! `envcrypt import`: merge secrets from a `.env` or JSON file.
//!
//! The format is detected from the extension: `.json` files must hold
//! an object; anything else is parsed as `.env`. Entries whose names are
//! not valid secret keys are skipped with a warning.

use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::env_parser;
use crate::cli::output;
use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::{EnvCryptError, Result};
use crate::vault::validate_key;

/// Execute the `import` command.
pub fn execute(cli: &Cli, file_path: &str) -> Result<()> {
    let source = Path::new(file_path);
    let ctx = VaultContext::open(cli)?;

    let outcome = import_file(cli, &ctx, source);
    let (imported, skipped) = ctx.audited("import", None, outcome)?;

    if skipped > 0 {
        output::warning(&format!("Skipped {skipped} entries with invalid names"));
    }
    if imported == 0 {
        output::warning("No secrets found in the import file.");
        return Ok(());
    }

    output::success(&format!(
        "Imported {imported} secrets from {} into '{}' vault",
        source.display(),
        ctx.vault.environment
    ));
    Ok(())
}

fn import_file(cli: &Cli, ctx: &VaultContext, source: &Path) -> Result<(usize, usize)> {
    if !source.exists() {
        return Err(EnvCryptError::CommandFailed(format!(
            "import file not found: {}",
            source.display()
        )));
    }

    let pairs = match detect_format(source) {
        "json" => parse_json_file(source)?,
        _ => env_parser::parse_env_file(source)?,
    };

    let (valid, invalid): (Vec<_>, Vec<_>) = pairs
        .into_iter()
        .partition(|(key, _)| validate_key(key).is_ok());
    for (key, _) in &invalid {
        tracing::warn!(key = %key, "skipping invalid key during import");
    }
    if valid.is_empty() {
        return Ok((0, invalid.len()));
    }

    let password = read_password(cli)?;
    let mut secrets = ctx.store.load_or_empty(&password)?;
    for (key, value) in &valid {
        secrets.insert(key, value)?;
        output::info(&format!("  + {key}"));
    }
    ctx.store.save(&secrets, &password)?;

    Ok((valid.len(), invalid.len()))
}

/// Detect the file format from its extension.
fn detect_format(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => "json",
        _ => "env",
    }
}

/// Parse a JSON object into (key, value) pairs. Non-string values keep
/// their JSON text.
fn parse_json_file(path: &Path) -> Result<Vec<(String, String)>> {
    let content = Zeroizing::new(
        fs::read_to_string(path)
            .map_err(|e| EnvCryptError::CommandFailed(format!("failed to read file: {e}")))?,
    );

    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| EnvCryptError::CommandFailed(format!("invalid JSON: {e}")))?;

    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
