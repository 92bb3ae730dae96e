//! `envcrypt list`: display all secret names in a table.

use crate::cli::output;
use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = VaultContext::open(cli)?;

    let outcome = read_password(cli).and_then(|pw| ctx.store.load(&pw));
    let secrets = ctx.audited("list", None, outcome)?;

    output::info(&format!(
        "{} environment ({} scope): {} secret(s)",
        ctx.vault.environment,
        ctx.vault.scope,
        secrets.len()
    ));
    output::print_secrets_table(&secrets);

    Ok(())
}
