//! Configuration: global and project TOML files merged into `Settings`.

pub mod settings;

pub use settings::{
    parse_memory_kib, AuditSettings, EnvironmentEntry, Settings, DEFAULT_ENVIRONMENT,
    DEFAULT_VAULT_DIR,
};
