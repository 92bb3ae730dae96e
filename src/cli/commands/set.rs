//! `envcrypt set`: add or update a secret in the vault.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::{EnvCryptError, Result};
use crate::vault::validate_key;

/// Execute the `set` command.
pub fn execute(cli: &Cli, key: &str, value: Option<&str>) -> Result<()> {
    // Reject bad names before asking for anything.
    validate_key(key)?;

    let ctx = VaultContext::open(cli)?;
    let outcome = set_secret(cli, &ctx, key, value);
    let (existed, total) = ctx.audited("set", Some(key), outcome)?;

    let verb = if existed { "updated in" } else { "added to" };
    output::success(&format!(
        "Secret '{key}' {verb} {} vault ({total} total)",
        ctx.vault.environment
    ));
    output::tip("Run your app: envcrypt run -- <command>");

    Ok(())
}

fn set_secret(
    cli: &Cli,
    ctx: &VaultContext,
    key: &str,
    value: Option<&str>,
) -> Result<(bool, usize)> {
    let secret_value = read_value(key, value)?;

    let password = read_password(cli)?;
    let mut secrets = ctx.store.load_or_empty(&password)?;
    let existed = secrets.insert(key, &secret_value)?;
    ctx.store.save(&secrets, &password)?;

    Ok((existed, secrets.len()))
}

/// Determine the secret value from one of three sources.
fn read_value(key: &str, value: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line; it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        // Source 2: Piped input.
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed_len = buf.trim_end_matches(['\r', '\n']).len();
        buf.truncate(trimmed_len);
        return Ok(buf);
    }

    // Source 3: Interactive secure prompt.
    let v = dialoguer::Password::new()
        .with_prompt(format!("Enter value for {key}"))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| EnvCryptError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(v))
}
