//! `envcrypt remove`: remove a secret from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::{EnvCryptError, Result};

/// Execute the `remove` command.
pub fn execute(cli: &Cli, key: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove secret '{key}'?"))
            .default(false)
            .interact()
            .map_err(|e| EnvCryptError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let ctx = VaultContext::open(cli)?;

    let outcome = remove_secret(cli, &ctx, key);
    ctx.audited("remove", Some(key), outcome)?;

    output::success(&format!("Removed secret '{key}'"));
    Ok(())
}

fn remove_secret(cli: &Cli, ctx: &VaultContext, key: &str) -> Result<()> {
    let password = read_password(cli)?;
    let mut secrets = ctx.store.load(&password)?;
    if !secrets.remove(key) {
        return Err(EnvCryptError::SecretNotFound(key.to_string()));
    }
    ctx.store.save(&secrets, &password)
}
