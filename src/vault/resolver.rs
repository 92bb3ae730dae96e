//! Decide which vault file a command operates on.
//!
//! A vault is either *project* scoped (`<root>/.envcrypt/<env>.vault`)
//! or *global* (`~/.envcrypt.vault`, used when the project root is the
//! home directory itself). The answer depends only on the working
//! directory, the home directory, the merged settings and the requested
//! environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Settings, DEFAULT_ENVIRONMENT, DEFAULT_VAULT_DIR};
use crate::errors::{EnvCryptError, Result};

/// File name of the global vault inside the home directory.
pub const GLOBAL_VAULT_FILE: &str = ".envcrypt.vault";

/// Extension of per-environment vault files.
pub const VAULT_EXTENSION: &str = "vault";

/// Audit database name inside the vault directory.
const AUDIT_DB_FILE: &str = "audit.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultScope {
    Project,
    Global,
}

impl fmt::Display for VaultScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultScope::Project => f.write_str("project"),
            VaultScope::Global => f.write_str("global"),
        }
    }
}

/// Where a vault lives and what it is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVault {
    pub path: PathBuf,
    pub scope: VaultScope,
    pub environment: String,
}

/// Walk upward from `start` looking for a project marker.
///
/// Markers: a `.envcrypt/` directory, `.envcrypt/dev.vault`, or a
/// `.envcrypt.toml` file. The nearest match wins; with none, `start`
/// itself is the root.
pub fn find_project_root(start: &Path) -> PathBuf {
    for dir in start.ancestors() {
        let vault_dir = dir.join(DEFAULT_VAULT_DIR);
        let has_marker = vault_dir.is_dir()
            || vault_dir.join("dev.vault").is_file()
            || dir.join(Settings::FILE_NAME).is_file();

        if has_marker {
            tracing::debug!(root = %dir.display(), "found project root");
            return dir.to_path_buf();
        }
    }
    start.to_path_buf()
}

/// Validate that an environment name is safe to use as a file name.
///
/// Allowed: lowercase letters, digits, hyphens. Must not be empty
/// or start/end with a hyphen. Max length 64 characters.
pub fn validate_env_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EnvCryptError::ConfigError(
            "environment name cannot be empty".into(),
        ));
    }

    if name.len() > 64 {
        return Err(EnvCryptError::ConfigError(
            "environment name cannot exceed 64 characters".into(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(EnvCryptError::ConfigError(format!(
            "environment name '{name}' is invalid: only lowercase letters, digits, and hyphens are allowed"
        )));
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(EnvCryptError::ConfigError(format!(
            "environment name '{name}' cannot start or end with a hyphen"
        )));
    }

    Ok(())
}

/// Maps environment names to vault files for one project.
#[derive(Debug, Clone)]
pub struct Resolver {
    project_root: PathBuf,
    home: PathBuf,
    settings: Settings,
}

impl Resolver {
    pub fn new(
        project_root: impl Into<PathBuf>,
        home: impl Into<PathBuf>,
        settings: Settings,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            home: home.into(),
            settings,
        }
    }

    /// Find the project root above `cwd` and load its merged settings.
    pub fn discover(cwd: &Path, home: &Path) -> Result<Self> {
        let root = find_project_root(cwd);
        let settings = Settings::load(&root, home)?;
        Ok(Self::new(root, home, settings))
    }

    /// [`Resolver::discover`] for the process's working and home directories.
    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let home = dirs::home_dir().ok_or_else(|| {
            EnvCryptError::ConfigError("could not determine home directory".into())
        })?;
        Self::discover(&cwd, &home)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The environment used when the caller passes an empty name.
    pub fn default_environment(&self) -> &str {
        if self.settings.default_env.is_empty() {
            DEFAULT_ENVIRONMENT
        } else {
            &self.settings.default_env
        }
    }

    /// Resolve `environment` to a vault path, creating its directories.
    ///
    /// The vault file itself is never created here.
    pub fn resolve(&self, environment: &str) -> Result<ResolvedVault> {
        let vault = self.locate(environment)?;
        if vault.scope == VaultScope::Project {
            if let Some(dir) = vault.path.parent() {
                create_dir(dir)?;
            }
        }
        Ok(vault)
    }

    /// [`Resolver::resolve`] without touching the filesystem.
    pub fn locate(&self, environment: &str) -> Result<ResolvedVault> {
        let environment = if environment.is_empty() {
            self.default_environment()
        } else {
            environment
        };
        validate_env_name(environment)?;

        if self.is_global() {
            let path = self.home.join(GLOBAL_VAULT_FILE);
            tracing::debug!(path = %path.display(), "using global vault");
            return Ok(ResolvedVault {
                path,
                scope: VaultScope::Global,
                environment: environment.to_string(),
            });
        }

        let mut dir = self.vault_dir();
        if let Some(sub) = self.settings.environment_dir(environment) {
            dir = dir.join(sub);
        }

        let path = dir.join(format!("{environment}.{VAULT_EXTENSION}"));
        tracing::debug!(path = %path.display(), environment, "using project vault");

        Ok(ResolvedVault {
            path,
            scope: VaultScope::Project,
            environment: environment.to_string(),
        })
    }

    /// Default audit database location for this project.
    ///
    /// `audit.file_path` is taken relative to the project root. Without
    /// it the database sits in the vault directory, or next to the
    /// global vault for global scope.
    pub fn audit_db_path(&self) -> PathBuf {
        if let Some(configured) = &self.settings.audit.file_path {
            let p = Path::new(configured);
            return if p.is_absolute() {
                p.to_path_buf()
            } else {
                self.project_root.join(p)
            };
        }

        if self.is_global() {
            self.home.join(".envcrypt-audit.db")
        } else {
            self.vault_dir().join(AUDIT_DB_FILE)
        }
    }

    fn vault_dir(&self) -> PathBuf {
        let configured = Path::new(&self.settings.vault_dir);
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.project_root.join(configured)
        }
    }

    fn is_global(&self) -> bool {
        same_path(&self.project_root, &self.home)
    }
}

/// Compare canonical forms when both exist, raw paths otherwise.
fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| EnvCryptError::VaultWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}
