//! Audit log: a history of vault operations.
//!
//! Every command records what it did, to which vault, and whether it
//! succeeded. Recording is fire-and-forget: if the database can't be
//! opened or written, the command carries on and a warning is logged.
//!
//! Environment overrides:
//! - `ENVCRYPT_AUDIT_DISABLE=1` (or `true`) turns auditing off.
//! - `ENVCRYPT_AUDIT_LOG=<path>` chooses the database file.

#[cfg(feature = "audit-log")]
mod sqlite;

#[cfg(feature = "audit-log")]
pub use sqlite::{AuditEntry, AuditLog, NewEntry};

use std::path::{Path, PathBuf};

use crate::vault::{ResolvedVault, Resolver};

pub const DISABLE_ENV: &str = "ENVCRYPT_AUDIT_DISABLE";
pub const PATH_ENV: &str = "ENVCRYPT_AUDIT_LOG";

/// Stored instead of the key name when `audit.mask_keys` is set.
pub const REDACTED_KEY: &str = "[redacted]";

/// Where (and whether) to write audit entries.
///
/// Returns `None` when auditing is disabled by config or by
/// `ENVCRYPT_AUDIT_DISABLE`.
pub fn database_path(
    enabled: bool,
    default_path: PathBuf,
    disable_var: Option<&str>,
    path_var: Option<&str>,
) -> Option<PathBuf> {
    let disabled_by_env = disable_var
        .map(|v| v.trim() == "1" || v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !enabled || disabled_by_env {
        return None;
    }

    match path_var.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => Some(PathBuf::from(p)),
        None => Some(default_path),
    }
}

/// Records command outcomes against one resolved vault.
pub struct Auditor {
    db_path: Option<PathBuf>,
    environment: String,
    vault_path: String,
    mask_keys: bool,
}

impl Auditor {
    /// Build an auditor for `vault`, honouring settings and env overrides.
    pub fn for_vault(resolver: &Resolver, vault: &ResolvedVault) -> Self {
        let settings = resolver.settings();
        let db_path = database_path(
            settings.audit.enabled,
            resolver.audit_db_path(),
            std::env::var(DISABLE_ENV).ok().as_deref(),
            std::env::var(PATH_ENV).ok().as_deref(),
        );

        Self {
            db_path,
            environment: vault.environment.clone(),
            vault_path: vault.path.display().to_string(),
            mask_keys: settings.audit.mask_keys,
        }
    }

    /// An auditor that records nothing.
    pub fn disabled() -> Self {
        Self {
            db_path: None,
            environment: String::new(),
            vault_path: String::new(),
            mask_keys: false,
        }
    }

    /// The database this auditor writes to, if any.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Record the outcome of `action`. Never fails.
    pub fn record<T>(&self, action: &str, key: Option<&str>, outcome: &crate::errors::Result<T>) {
        let Some(db_path) = &self.db_path else {
            return;
        };

        let error = outcome.as_ref().err().map(|e| {
            let text = e.to_string();
            match key {
                Some(k) if self.mask_keys => mask_key(&text, k),
                _ => text,
            }
        });
        let key = key.map(|k| if self.mask_keys { REDACTED_KEY } else { k });

        #[cfg(feature = "audit-log")]
        {
            let entry = NewEntry {
                action,
                environment: &self.environment,
                vault_path: &self.vault_path,
                key,
                error: error.as_deref(),
            };
            if let Err(e) = AuditLog::open(db_path).and_then(|log| log.append(&entry)) {
                tracing::warn!(db = %db_path.display(), error = %e, "audit entry not recorded");
            }
        }

        #[cfg(not(feature = "audit-log"))]
        tracing::debug!(
            db = %db_path.display(),
            action,
            ?key,
            ?error,
            environment = %self.environment,
            vault = %self.vault_path,
            "audit log support not compiled in"
        );
    }
}

/// Replace every occurrence of `key` in `text` with [`REDACTED_KEY`].
fn mask_key(text: &str, key: &str) -> String {
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, REDACTED_KEY)
}
