//! `envcrypt create-shares`: split the master password into K-of-N shares.
//!
//! The password is checked against the vault first (when one exists),
//! so a typo can't be turned into a useless set of shares.

use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::cli::{read_password, Cli, VaultContext};
use crate::errors::{EnvCryptError, Result};
use crate::sharing::{self, Share};

/// Execute the `create-shares` command.
pub fn execute(cli: &Cli, parts: u8, threshold: u8, out_dir: &str) -> Result<()> {
    let ctx = VaultContext::open(cli)?;

    let outcome = create_shares(cli, &ctx, parts, threshold, Path::new(out_dir));
    let written = ctx.audited("create-shares", None, outcome)?;

    output::success(&format!(
        "Wrote {parts} shares to {out_dir}; any {threshold} recover the password"
    ));
    for path in &written {
        output::info(&format!("  {}", path.display()));
    }
    output::tip("Store each share in a different place. Recover with: envcrypt recover <files>");

    Ok(())
}

fn create_shares(
    cli: &Cli,
    ctx: &VaultContext,
    parts: u8,
    threshold: u8,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let password = read_password(cli)?;

    if ctx.store.exists() {
        ctx.store.load(&password)?;
    } else {
        output::warning("No vault exists yet; sharing the password as entered.");
    }

    let shares = sharing::split(password.as_bytes(), parts, threshold)?;
    write_shares(&shares, out_dir)
}

/// Write every share or none of them.
///
/// All target paths are checked before the first write, and shares
/// already written are removed if a later write fails, so a new share
/// never ends up beside one from an older split.
fn write_shares(shares: &[Share], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = shares
        .iter()
        .map(|share| out_dir.join(sharing::share_file_name(share.index())))
        .collect();

    if let Some(existing) = paths.iter().find(|p| p.exists()) {
        return Err(EnvCryptError::CommandFailed(format!(
            "{} already exists; refusing to overwrite",
            existing.display()
        )));
    }

    for (i, (share, path)) in shares.iter().zip(&paths).enumerate() {
        if let Err(e) = sharing::write_share_file(share, path) {
            for written in &paths[..i] {
                if let Err(rm) = std::fs::remove_file(written) {
                    tracing::warn!(
                        path = %written.display(),
                        error = %rm,
                        "could not remove share"
                    );
                }
            }
            return Err(e);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn existing_share_blocks_every_write() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(sharing::share_file_name(2)), "old share").unwrap();

        let shares = sharing::split(b"pw", 3, 2).unwrap();
        let err = write_shares(&shares, dir.path()).unwrap_err();
        assert!(err.to_string().contains("share-2.txt"));

        assert!(!dir.path().join(sharing::share_file_name(1)).exists());
        assert!(!dir.path().join(sharing::share_file_name(3)).exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join(sharing::share_file_name(2))).unwrap(),
            "old share"
        );
    }

    #[test]
    fn writes_all_shares_into_a_fresh_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("shares");
        let shares = sharing::split(b"pw", 4, 3).unwrap();

        let written = write_shares(&shares, &out).unwrap();
        assert_eq!(written.len(), 4);
        assert!(written.iter().all(|p| p.exists()));
    }
}
