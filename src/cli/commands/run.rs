//! `envcrypt run`: inject secrets into a child process.

use crate::cli::output;
use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::{EnvCryptError, Result};
use crate::injector;

/// Execute the `run` command.
pub fn execute(cli: &Cli, command: &[String], clean_env: bool) -> Result<()> {
    if command.is_empty() {
        return Err(EnvCryptError::NoCommandSpecified);
    }

    let ctx = VaultContext::open(cli)?;

    let loaded = read_password(cli).and_then(|pw| ctx.store.load(&pw));
    let secrets = ctx.audited("run", None, loaded)?;

    let target = if clean_env { "clean environment" } else { "environment" };
    output::success(&format!("Injected {} secrets into {target}", secrets.len()));

    injector::run_argv(command, &secrets, clean_env)
}
