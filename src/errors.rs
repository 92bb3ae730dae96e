use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in envcrypt.
#[derive(Debug, Error)]
pub enum EnvCryptError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid vault data: file is too short to hold a salt")]
    InvalidVaultData,

    #[error("Ciphertext too short: vault file is truncated")]
    CiphertextTooShort,

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Failed to read vault {path}: {source}")]
    VaultReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write vault {path}: {source}")]
    VaultWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Key cannot be empty")]
    EmptyKey,

    #[error("Key '{0}' contains invalid characters: '=' is not allowed")]
    InvalidKey(String),

    // --- Secret sharing errors ---
    #[error("At least 2 shares are required to recover a secret (got {0})")]
    InsufficientShares(usize),

    #[error("Invalid sharing parameters: {0}")]
    InvalidShareParams(String),

    #[error("Invalid share: {0}")]
    InvalidShare(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    AuditError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password mismatch: passwords do not match")]
    PasswordMismatch,

    #[error("Child process exited with code {0}")]
    ChildProcessFailed(i32),

    #[error("No command specified: use `envcrypt run -- <command>`")]
    NoCommandSpecified,
}

/// Convenience type alias for envcrypt results.
pub type Result<T> = std::result::Result<T, EnvCryptError>;
