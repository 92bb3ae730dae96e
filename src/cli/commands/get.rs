//! `envcrypt get`: retrieve and print a single secret's value.

use zeroize::Zeroizing;

use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::{EnvCryptError, Result};

/// Execute the `get` command.
pub fn execute(cli: &Cli, key: &str) -> Result<()> {
    let ctx = VaultContext::open(cli)?;

    let outcome = lookup(cli, &ctx, key);
    let value = ctx.audited("get", Some(key), outcome)?;

    // Print the bare value so it can be captured by scripts.
    println!("{}", value.as_str());
    Ok(())
}

fn lookup(cli: &Cli, ctx: &VaultContext, key: &str) -> Result<Zeroizing<String>> {
    let password = read_password(cli)?;
    let secrets = ctx.store.load(&password)?;
    secrets
        .get(key)
        .map(|v| Zeroizing::new(v.to_string()))
        .ok_or_else(|| EnvCryptError::SecretNotFound(key.to_string()))
}
