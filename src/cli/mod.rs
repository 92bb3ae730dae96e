//! CLI module: Clap argument parser, password helpers, and command implementations.

pub mod commands;
pub mod env_parser;
pub mod output;

use clap::Parser;
use zeroize::Zeroizing;

use crate::audit::Auditor;
use crate::crypto::Password;
use crate::errors::{EnvCryptError, Result};
use crate::vault::{ResolvedVault, Resolver, VaultStore};

/// Non-interactive master password (CI/CD).
pub const PASSWORD_ENV: &str = "ENVCRYPT_PASSWORD";

/// Non-interactive new password for `change-password`.
pub const NEW_PASSWORD_ENV: &str = "ENVCRYPT_NEW_PASSWORD";

/// envcrypt: encrypted local secret vault.
#[derive(Parser)]
#[command(
    name = "envcrypt",
    about = "Encrypted local secret vault that injects secrets into child processes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Environment to use (default: `default_env` from config, else dev)
    #[arg(short, long, default_value = "", global = true, hide_default_value = true)]
    pub env: String,

    /// Master password (discouraged: visible in shell history and process lists)
    #[arg(short = 'p', long = "pass", global = true)]
    pub pass: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Set a secret (add or update)
    Set {
        /// Secret name (e.g. DATABASE_URL)
        key: String,
        /// Secret value (omit to read stdin or prompt)
        value: Option<String>,
    },

    /// Get a secret's value
    Get {
        /// Secret name
        key: String,
    },

    /// List all secret names
    List,

    /// Remove a secret
    Remove {
        /// Secret name
        key: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Import secrets from a .env (or JSON) file
    Import {
        /// Path to the file to import
        file: String,
    },

    /// Export secrets to a file or stdout
    Export {
        /// Output format: env or json (default: from config, else json)
        #[arg(short, long)]
        format: Option<String>,

        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run a command with secrets injected
    Run {
        /// Command and arguments (after --)
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,

        /// Start with a clean environment (only vault secrets, no inherited vars)
        #[arg(long)]
        clean_env: bool,
    },

    /// Change the vault's master password
    ChangePassword,

    /// Show vault location, scope, and contents summary
    Stats,

    /// Split the master password into recovery shares
    CreateShares {
        /// Total number of shares to create
        #[arg(long, default_value = "5")]
        parts: u8,
        /// Number of shares needed to recover the password
        #[arg(long, default_value = "3")]
        threshold: u8,
        /// Directory to write share files into
        #[arg(long, default_value = ".")]
        out: String,
    },

    /// Recover the master password from share files
    Recover {
        /// Share files (any order)
        #[arg(required = true, num_args = 2..)]
        shares: Vec<String>,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show
        #[arg(long, default_value = "50")]
        last: usize,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Everything a vault command needs: where the vault is, how to read it,
/// and where to record what happened.
pub struct VaultContext {
    pub resolver: Resolver,
    pub vault: ResolvedVault,
    pub store: VaultStore,
    pub auditor: Auditor,
}

impl VaultContext {
    /// Resolve the vault for `cli.env` from the current directory.
    pub fn open(cli: &Cli) -> Result<Self> {
        let resolver = Resolver::from_current_dir()?;
        Self::with_resolver(resolver, &cli.env)
    }

    pub fn with_resolver(resolver: Resolver, environment: &str) -> Result<Self> {
        let vault = resolver.resolve(environment)?;
        let store = VaultStore::new(&vault.path, resolver.settings().kdf_params()?);
        let auditor = Auditor::for_vault(&resolver, &vault);

        tracing::debug!(
            path = %vault.path.display(),
            scope = %vault.scope,
            environment = %vault.environment,
            "resolved vault"
        );

        Ok(Self {
            resolver,
            vault,
            store,
            auditor,
        })
    }

    /// Record `outcome` in the audit log and hand it back.
    pub fn audited<T>(&self, action: &str, key: Option<&str>, outcome: Result<T>) -> Result<T> {
        self.auditor.record(action, key, &outcome);
        outcome
    }
}

/// Get the master password, trying in order:
/// 1. `ENVCRYPT_PASSWORD` env var (CI/CD)
/// 2. `--pass` flag (with a warning)
/// 3. Interactive prompt
pub fn read_password(cli: &Cli) -> Result<Password> {
    password_from_sources(
        std::env::var(PASSWORD_ENV).ok().map(Zeroizing::new),
        cli.pass.as_deref(),
        || prompt_hidden("Enter vault password"),
    )
}

/// Prompt for a new password, entered twice.
///
/// `ENVCRYPT_NEW_PASSWORD` skips the prompt for scripted use.
pub fn read_new_password() -> Result<Password> {
    if let Ok(pw) = std::env::var(NEW_PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Password::from(Zeroizing::new(pw)));
        }
    }

    let first = prompt_hidden("Choose new vault password")?;
    let second = prompt_hidden("Confirm new vault password")?;

    let first = non_empty(Password::from(first))?;
    if !first.ct_eq(&Password::from(second)) {
        return Err(EnvCryptError::PasswordMismatch);
    }
    Ok(first)
}

fn password_from_sources(
    from_env: Option<Zeroizing<String>>,
    from_flag: Option<&str>,
    prompt: impl FnOnce() -> Result<Zeroizing<String>>,
) -> Result<Password> {
    if let Some(pw) = from_env.filter(|p| !p.is_empty()) {
        tracing::debug!("using password from {PASSWORD_ENV}");
        return Ok(Password::from(pw));
    }

    if let Some(pw) = from_flag {
        output::warning("Password passed with --pass; it may appear in shell history.");
        return non_empty(Password::from(pw));
    }

    non_empty(Password::from(prompt()?))
}

fn non_empty(password: Password) -> Result<Password> {
    if password.is_empty() {
        return Err(EnvCryptError::EmptyPassword);
    }
    Ok(password)
}

fn prompt_hidden(prompt: &str) -> Result<Zeroizing<String>> {
    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| EnvCryptError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never_prompt() -> Result<Zeroizing<String>> {
        panic!("prompt must not be reached")
    }

    #[test]
    fn env_var_wins_over_flag() {
        let pw = password_from_sources(
            Some(Zeroizing::new("from-env".into())),
            Some("from-flag"),
            never_prompt,
        )
        .unwrap();
        assert_eq!(pw.as_bytes(), b"from-env");
    }

    #[test]
    fn empty_env_var_falls_through_to_flag() {
        let pw = password_from_sources(
            Some(Zeroizing::new(String::new())),
            Some("flag"),
            never_prompt,
        )
        .unwrap();
        assert_eq!(pw.as_bytes(), b"flag");
    }

    #[test]
    fn prompt_is_last_resort() {
        let pw = password_from_sources(None, None, || Ok(Zeroizing::new("typed".into()))).unwrap();
        assert_eq!(pw.as_bytes(), b"typed");
    }

    #[test]
    fn empty_password_is_rejected() {
        let result = password_from_sources(None, None, || Ok(Zeroizing::new(String::new())));
        assert!(matches!(result, Err(EnvCryptError::EmptyPassword)));

        let result = password_from_sources(None, Some(""), never_prompt);
        assert!(matches!(result, Err(EnvCryptError::EmptyPassword)));
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["envcrypt", "get", "API_KEY", "-e", "prod"]).unwrap();
        assert_eq!(cli.env, "prod");
        assert!(matches!(cli.command, Commands::Get { ref key } if key == "API_KEY"));
    }

    #[test]
    fn recover_needs_two_files() {
        assert!(Cli::try_parse_from(["envcrypt", "recover", "share-1.txt"]).is_err());
        assert!(Cli::try_parse_from(["envcrypt", "recover", "a", "b"]).is_ok());
    }

    #[test]
    fn run_keeps_trailing_args() {
        let cli = Cli::try_parse_from([
            "envcrypt",
            "run",
            "--clean-env",
            "--",
            "node",
            "app.js",
            "--port",
            "3000",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { command, clean_env } => {
                assert!(clean_env);
                assert_eq!(command, vec!["node", "app.js", "--port", "3000"]);
            }
            _ => panic!("expected run"),
        }
    }
}
