//! `envcrypt recover`: rebuild the master password from share files.

use std::path::Path;

use crate::audit::Auditor;
use crate::cli::Cli;
use crate::errors::{EnvCryptError, Result};
use crate::sharing::{self, Share};
use crate::vault::Resolver;

/// Execute the `recover` command.
///
/// Prints the recovered password to stdout. Supplying fewer shares than
/// the original threshold yields a wrong password, not an error.
pub fn execute(cli: &Cli, share_files: &[String]) -> Result<()> {
    let auditor = recovery_auditor(cli)?;

    let outcome = recover(share_files);
    auditor.record("recover", None, &outcome);
    let secret = outcome?;

    let text = std::str::from_utf8(&secret)
        .map_err(|_| EnvCryptError::InvalidShare("recovered bytes are not UTF-8".into()))?;
    println!("{text}");
    Ok(())
}

/// Recovery can run anywhere, so it only audits into a directory that
/// already exists.
fn recovery_auditor(cli: &Cli) -> Result<Auditor> {
    let resolver = Resolver::from_current_dir()?;
    let vault = resolver.locate(&cli.env)?;
    let auditor = Auditor::for_vault(&resolver, &vault);

    match auditor.db_path() {
        Some(db) if !parent_exists(db) => {
            tracing::debug!(db = %db.display(), "no audit directory here; recovery not audited");
            Ok(Auditor::disabled())
        }
        _ => Ok(auditor),
    }
}

fn parent_exists(path: &Path) -> bool {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.is_dir(),
        _ => true,
    }
}

fn recover(share_files: &[String]) -> Result<zeroize::Zeroizing<Vec<u8>>> {
    let shares = share_files
        .iter()
        .map(|f| sharing::read_share_file(Path::new(f)))
        .collect::<Result<Vec<Share>>>()?;
    sharing::combine(&shares)
}
