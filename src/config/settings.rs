use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crypto::kdf::{
    KdfParams, DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM,
};
use crate::errors::{EnvCryptError, Result};

/// Environment used when none is given on the command line or in config.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Project vault directory, relative to the project root.
pub const DEFAULT_VAULT_DIR: &str = ".envcrypt";

/// Resolved configuration, merged from the global and project files.
///
/// Every field has a sensible default so envcrypt works out-of-the-box
/// without any config file at all. Values are read-only once loaded and
/// are passed explicitly to whatever needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Which environment to use when none is specified (e.g. "dev").
    pub default_env: String,

    /// Directory (relative to project root unless absolute) holding vault files.
    pub vault_dir: String,

    /// Argon2 memory cost in KiB (default: 64 MB).
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 1).
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    pub argon2_parallelism: u32,

    /// Per-environment overrides, keyed by environment name.
    pub environments: BTreeMap<String, EnvironmentEntry>,

    pub audit: AuditSettings,

    /// Export format used when `--format` is not given ("env" or "json").
    pub export_format: String,
}

/// Per-environment override (`[environments.<name>]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvironmentEntry {
    /// Subdirectory of the vault dir holding this environment's vault.
    #[serde(default)]
    pub dir: Option<String>,
}

/// Audit log options (`[audit]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSettings {
    pub enabled: bool,
    /// Database path, relative to the project root unless absolute.
    pub file_path: Option<String>,
    /// Record `[redacted]` instead of secret names.
    pub mask_keys: bool,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file_path: None,
            mask_keys: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_env: DEFAULT_ENVIRONMENT.to_string(),
            vault_dir: DEFAULT_VAULT_DIR.to_string(),
            argon2_memory_kib: DEFAULT_MEMORY_KIB,
            argon2_iterations: DEFAULT_ITERATIONS,
            argon2_parallelism: DEFAULT_PARALLELISM,
            environments: BTreeMap::new(),
            audit: AuditSettings::default(),
            export_format: "json".to_string(),
        }
    }
}

// ── On-disk representation ───────────────────────────────────────────

/// One config file as written by the user. Every field is optional so
/// a project file can override just the parts it cares about.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    default_env: Option<String>,
    vault_dir: Option<String>,
    argon2: Argon2File,
    environments: BTreeMap<String, EnvironmentEntry>,
    audit: AuditFile,
    export: ExportFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Argon2File {
    /// Human-readable size: "64MB", "512KB", "1GB" or a bare KiB count.
    memory: Option<String>,
    iterations: Option<u32>,
    parallelism: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuditFile {
    enabled: Option<bool>,
    file_path: Option<String>,
    mask_keys: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportFile {
    default_format: Option<String>,
}

impl SettingsFile {
    /// Parse a config file. A missing or unparseable file reads as `None`,
    /// so the other layer (or the defaults) applies.
    fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)?;
        match toml::from_str::<SettingsFile>(&contents) {
            Ok(file) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                Ok(Some(file))
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring unparseable config file"
                );
                Ok(None)
            }
        }
    }

    /// Field-by-field overlay: anything set in `over` wins.
    fn overlay(self, over: SettingsFile) -> SettingsFile {
        let mut environments = self.environments;
        environments.extend(over.environments);

        SettingsFile {
            default_env: over.default_env.or(self.default_env),
            vault_dir: over.vault_dir.or(self.vault_dir),
            argon2: Argon2File {
                memory: over.argon2.memory.or(self.argon2.memory),
                iterations: over.argon2.iterations.or(self.argon2.iterations),
                parallelism: over.argon2.parallelism.or(self.argon2.parallelism),
            },
            environments,
            audit: AuditFile {
                enabled: over.audit.enabled.or(self.audit.enabled),
                file_path: over.audit.file_path.or(self.audit.file_path),
                mask_keys: over.audit.mask_keys.or(self.audit.mask_keys),
            },
            export: ExportFile {
                default_format: over.export.default_format.or(self.export.default_format),
            },
        }
    }

    /// Apply defaults and validate. Bad memory sizes fail here, at load
    /// time, rather than when a key is derived.
    fn resolve(self) -> Result<Settings> {
        let defaults = Settings::default();

        let argon2_memory_kib = match self.argon2.memory.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_memory_kib(raw)?,
            _ => defaults.argon2_memory_kib,
        };

        let settings = Settings {
            default_env: non_empty(self.default_env).unwrap_or(defaults.default_env),
            vault_dir: non_empty(self.vault_dir).unwrap_or(defaults.vault_dir),
            argon2_memory_kib,
            argon2_iterations: self
                .argon2
                .iterations
                .filter(|&n| n > 0)
                .unwrap_or(defaults.argon2_iterations),
            argon2_parallelism: self
                .argon2
                .parallelism
                .filter(|&n| n > 0)
                .unwrap_or(defaults.argon2_parallelism),
            environments: self.environments,
            audit: AuditSettings {
                enabled: self.audit.enabled.unwrap_or(defaults.audit.enabled),
                file_path: non_empty(self.audit.file_path),
                mask_keys: self.audit.mask_keys.unwrap_or(defaults.audit.mask_keys),
            },
            export_format: non_empty(self.export.default_format)
                .unwrap_or(defaults.export_format),
        };

        // Surface invalid Argon2 combinations now.
        settings.kdf_params()?;
        Ok(settings)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ── Implementation ───────────────────────────────────────────────────

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".envcrypt.toml";

    /// Global config location, relative to the home directory.
    const GLOBAL_RELATIVE_PATH: &'static str = ".config/envcrypt/config.toml";

    /// Load and merge `~/.config/envcrypt/config.toml` and
    /// `<project_root>/.envcrypt.toml`.
    ///
    /// Missing files fall back to defaults. A file that exists but cannot
    /// be parsed, or an invalid `argon2.memory` size, is an error.
    pub fn load(project_root: &Path, home: &Path) -> Result<Self> {
        let global = SettingsFile::read(&Self::global_path(home))?.unwrap_or_default();
        let project = SettingsFile::read(&project_root.join(Self::FILE_NAME))?.unwrap_or_default();

        global.overlay(project).resolve()
    }

    /// Load a single TOML document (no merging). Mostly useful in tests.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(contents)
            .map_err(|e| EnvCryptError::ConfigError(format!("Failed to parse config: {e}")))?;
        file.resolve()
    }

    /// Path of the global config file for a given home directory.
    pub fn global_path(home: &Path) -> PathBuf {
        home.join(Self::GLOBAL_RELATIVE_PATH)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn kdf_params(&self) -> Result<KdfParams> {
        KdfParams::new(
            self.argon2_memory_kib,
            self.argon2_iterations,
            self.argon2_parallelism,
        )
    }

    /// The configured subdirectory for `environment`, if any.
    pub fn environment_dir(&self, environment: &str) -> Option<&str> {
        self.environments
            .get(environment)
            .and_then(|e| e.dir.as_deref())
            .filter(|d| !d.is_empty())
    }
}

/// Parse a memory size into KiB.
///
/// Accepts `KB`, `MB` and `GB` suffixes (case-insensitive, binary
/// multiples); a bare number is taken as KiB.
pub fn parse_memory_kib(raw: &str) -> Result<u32> {
    let upper = raw.trim().to_ascii_uppercase();

    let (digits, multiplier): (&str, u64) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let invalid = || EnvCryptError::ConfigError(format!("invalid argon2 memory size '{raw}'"));

    let n: u64 = digits.trim().parse().map_err(|_| invalid())?;
    n.checked_mul(multiplier)
        .and_then(|kib| u32::try_from(kib).ok())
        .ok_or_else(invalid)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.default_env, "dev");
        assert_eq!(s.vault_dir, ".envcrypt");
        assert_eq!(s.argon2_memory_kib, 65_536);
        assert_eq!(s.argon2_iterations, 1);
        assert_eq!(s.argon2_parallelism, 4);
        assert!(s.audit.enabled);
        assert_eq!(s.export_format, "json");
    }

    #[test]
    fn load_returns_defaults_when_no_config_files() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let settings = Settings::load(project.path(), home.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_project_file() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let config = r#"
default_env = "staging"
vault_dir = "secrets"

[argon2]
memory = "128MB"
iterations = 3
parallelism = 2

[environments.prod]
dir = "production"

[audit]
mask_keys = true

[export]
default_format = "env"
"#;
        fs::write(project.path().join(".envcrypt.toml"), config).unwrap();

        let s = Settings::load(project.path(), home.path()).unwrap();
        assert_eq!(s.default_env, "staging");
        assert_eq!(s.vault_dir, "secrets");
        assert_eq!(s.argon2_memory_kib, 131_072);
        assert_eq!(s.argon2_iterations, 3);
        assert_eq!(s.argon2_parallelism, 2);
        assert_eq!(s.environment_dir("prod"), Some("production"));
        assert_eq!(s.environment_dir("dev"), None);
        assert!(s.audit.mask_keys);
        assert_eq!(s.export_format, "env");
    }

    #[test]
    fn project_overrides_global_field_by_field() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();

        let global_path = Settings::global_path(home.path());
        fs::create_dir_all(global_path.parent().unwrap()).unwrap();
        fs::write(
            &global_path,
            r#"
default_env = "global-env"
vault_dir = "/srv/vaults"

[argon2]
iterations = 4

[environments.dev]
dir = "global-dev"

[environments.qa]
dir = "global-qa"
"#,
        )
        .unwrap();
        fs::write(
            project.path().join(".envcrypt.toml"),
            r#"
default_env = "local"

[environments.dev]
dir = "local-dev"
"#,
        )
        .unwrap();

        let s = Settings::load(project.path(), home.path()).unwrap();
        assert_eq!(s.default_env, "local");
        assert_eq!(s.vault_dir, "/srv/vaults");
        assert_eq!(s.argon2_iterations, 4);
        assert_eq!(s.environment_dir("dev"), Some("local-dev"));
        assert_eq!(s.environment_dir("qa"), Some("global-qa"));
    }

    #[test]
    fn zero_costs_fall_back_to_defaults() {
        let s = Settings::from_toml("[argon2]\niterations = 0\nparallelism = 0\n").unwrap();
        assert_eq!(s.argon2_iterations, 1);
        assert_eq!(s.argon2_parallelism, 4);
    }

    #[test]
    fn unparseable_file_is_ignored() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        fs::write(project.path().join(".envcrypt.toml"), "not valid {{toml").unwrap();

        let settings = Settings::load(project.path(), home.path()).unwrap();
        assert_eq!(settings, Settings::default());

        let global = Settings::global_path(home.path());
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(&global, "default_env = \"staging\"\n").unwrap();

        let settings = Settings::load(project.path(), home.path()).unwrap();
        assert_eq!(settings.default_env, "staging");
    }

    #[test]
    fn malformed_memory_is_a_load_time_error() {
        assert!(Settings::from_toml("[argon2]\nmemory = \"64XB\"\n").is_err());
        assert!(Settings::from_toml("[argon2]\nmemory = \"lots\"\n").is_err());
        // Parses, but is below the 8 MB floor.
        assert!(Settings::from_toml("[argon2]\nmemory = \"1MB\"\n").is_err());
    }

    #[test]
    fn parse_memory_units() {
        assert_eq!(parse_memory_kib("64MB").unwrap(), 65_536);
        assert_eq!(parse_memory_kib("64mb").unwrap(), 65_536);
        assert_eq!(parse_memory_kib(" 512KB ").unwrap(), 512);
        assert_eq!(parse_memory_kib("1GB").unwrap(), 1_048_576);
        assert_eq!(parse_memory_kib("2048").unwrap(), 2048);
        assert!(parse_memory_kib("64XB").is_err());
        assert!(parse_memory_kib("abc").is_err());
        assert!(parse_memory_kib("-5MB").is_err());
        assert!(parse_memory_kib("99999999GB").is_err());
    }

    #[test]
    fn kdf_params_follow_settings() {
        let s = Settings {
            argon2_memory_kib: 16_384,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            ..Settings::default()
        };
        let p = s.kdf_params().unwrap();
        assert_eq!(p.memory_kib(), 16_384);
        assert_eq!(p.iterations(), 2);
        assert_eq!(p.parallelism(), 1);
    }
}
