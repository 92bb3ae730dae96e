//! `envcrypt stats`: where the vault lives and what is in it.

use crate::cli::output;
use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::Result;

/// Execute the `stats` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = VaultContext::open(cli)?;

    let outcome = read_password(cli).and_then(|pw| {
        let secrets = ctx.store.load(&pw)?;
        let modified = ctx.store.modified()?;
        Ok((secrets.len(), modified))
    });
    let (count, modified) = ctx.audited("stats", None, outcome)?;

    let kdf = ctx.store.kdf_params();
    output::print_details_table(&[
        ("Path", ctx.vault.path.display().to_string()),
        ("Scope", ctx.vault.scope.to_string()),
        ("Environment", ctx.vault.environment.clone()),
        ("Project root", ctx.resolver.project_root().display().to_string()),
        ("Secrets", count.to_string()),
        ("Last modified", modified.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        (
            "Argon2id",
            format!(
                "{} KiB, {} iteration(s), {} lane(s)",
                kdf.memory_kib(),
                kdf.iterations(),
                kdf.parallelism()
            ),
        ),
    ]);

    Ok(())
}
