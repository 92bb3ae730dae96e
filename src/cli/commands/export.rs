//! `envcrypt export`: export secrets in various formats.
//!
//! Supported formats:
//! - `env`: `.env` file format (KEY=value, one per line)
//! - `json`: JSON object { "KEY": "value", ... }
//!
//! Without `--format`, `export.default_format` from config is used.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::{EnvCryptError, Result};
use crate::vault::SecretSet;

/// Execute the `export` command.
pub fn execute(cli: &Cli, format: Option<&str>, output_path: Option<&str>) -> Result<()> {
    let ctx = VaultContext::open(cli)?;
    let format = format
        .unwrap_or(ctx.resolver.settings().export_format.as_str())
        .to_ascii_lowercase();

    let outcome = export_secrets(cli, &ctx, &format, output_path);
    let (count, content) = ctx.audited("export", None, outcome)?;

    match output_path {
        Some(dest) => output::success(&format!(
            "Exported {count} secrets to {dest} (format: {format})"
        )),
        // Raw output only, so it can be redirected.
        None => print!("{}", content.as_str()),
    }
    Ok(())
}

fn export_secrets(
    cli: &Cli,
    ctx: &VaultContext,
    format: &str,
    output_path: Option<&str>,
) -> Result<(usize, Zeroizing<String>)> {
    // Refuse to clobber a vault before asking for the password.
    if let Some(dest) = output_path {
        if Path::new(dest)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("vault"))
        {
            return Err(EnvCryptError::CommandFailed(
                "refusing to export over a .vault file".into(),
            ));
        }
    }

    let password = read_password(cli)?;
    let secrets = ctx.store.load(&password)?;

    let content = match format {
        "env" => format_as_env(&secrets),
        "json" => format_as_json(&secrets)?,
        other => {
            return Err(EnvCryptError::CommandFailed(format!(
                "unknown export format '{other}': use 'env' or 'json'"
            )));
        }
    };

    if let Some(dest) = output_path {
        write_private(Path::new(dest), content.as_bytes())?;
    }

    Ok((secrets.len(), content))
}

/// Write an export file readable only by the owner.
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| EnvCryptError::CommandFailed(format!("failed to write export file: {e}")))?;
    file.write_all(bytes)
        .map_err(|e| EnvCryptError::CommandFailed(format!("failed to write export file: {e}")))
}

/// Format secrets as `.env` file content.
fn format_as_env(secrets: &SecretSet) -> Zeroizing<String> {
    use std::fmt::Write;
    let mut out = Zeroizing::new(String::new());
    for (key, value) in secrets.iter() {
        // Quote values that contain spaces, special chars, or are empty.
        if value.is_empty()
            || value.contains(' ')
            || value.contains('#')
            || value.contains('"')
            || value.contains('\'')
            || value.contains('\n')
            || value.contains('$')
        {
            let escaped = Zeroizing::new(
                value
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n"),
            );
            let _ = writeln!(out, "{key}=\"{}\"", escaped.as_str());
        } else {
            let _ = writeln!(out, "{key}={value}");
        }
    }
    out
}

/// Format secrets as a pretty JSON object.
fn format_as_json(secrets: &SecretSet) -> Result<Zeroizing<String>> {
    let mut json = serde_json::to_string_pretty(secrets)
        .map_err(|e| EnvCryptError::SerializationError(format!("JSON export: {e}")))?;
    json.push('\n');
    Ok(Zeroizing::new(json))
}
