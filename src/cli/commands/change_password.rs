//! `envcrypt change-password`: re-encrypt the vault under a new password.
//!
//! Decrypts with the current password, then saves the same secrets with
//! the new one. The save draws a fresh salt and nonce, and is atomic, so
//! a failure leaves the vault readable with the old password.

use crate::cli::output;
use crate::cli::{read_new_password, read_password, Cli, VaultContext};
use crate::errors::Result;

/// Execute the `change-password` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = VaultContext::open(cli)?;

    let outcome = change_password(cli, &ctx);
    let count = ctx.audited("change-password", None, outcome)?;

    output::success(&format!(
        "Password changed for '{}' vault ({count} secrets re-encrypted)",
        ctx.vault.environment
    ));
    Ok(())
}

fn change_password(cli: &Cli, ctx: &VaultContext) -> Result<usize> {
    output::info("Enter your current vault password.");
    let old_password = read_password(cli)?;
    let secrets = ctx.store.load(&old_password)?;

    output::info("Choose your new vault password.");
    let new_password = read_new_password()?;
    ctx.store.save(&secrets, &new_password)?;

    tracing::info!(path = %ctx.vault.path.display(), "vault re-encrypted under new password");
    Ok(secrets.len())
}
