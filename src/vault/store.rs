//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` ties the storage layer and the envelope cipher together
//! so commands can work with a decrypted [`SecretSet`] and never touch
//! raw envelope bytes:
//!
//! ```text
//! load: file bytes -> decrypt(password) -> JSON -> SecretSet
//! save: SecretSet -> JSON -> encrypt(password) -> atomic write
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::crypto::envelope::{decrypt, encrypt};
use crate::crypto::{KdfParams, Password};
use crate::errors::{EnvCryptError, Result};

use super::secret::SecretSet;
use super::storage;

/// Handle on one vault file.
///
/// Holds no secrets itself: each `load` and `save` takes the password,
/// derives a fresh key and drops it before returning.
#[derive(Debug, Clone)]
pub struct VaultStore {
    /// Path to the `.vault` file on disk.
    path: PathBuf,

    /// Argon2id cost used for every key derivation on this vault.
    kdf: KdfParams,
}

impl VaultStore {
    pub fn new(path: impl Into<PathBuf>, kdf: KdfParams) -> Self {
        Self {
            path: path.into(),
            kdf,
        }
    }

    /// Decrypt and return the vault's secrets.
    ///
    /// Fails with `VaultNotFound` if the file does not exist, and with
    /// `DecryptionFailed` on a wrong password or tampered file.
    pub fn load(&self, password: &Password) -> Result<SecretSet> {
        let envelope = storage::load(&self.path)?;
        let plaintext = decrypt(&envelope, password, &self.kdf)?;
        let secrets = SecretSet::from_json(&plaintext)?;

        tracing::debug!(
            path = %self.path.display(),
            count = secrets.len(),
            "vault loaded"
        );
        Ok(secrets)
    }

    /// Like [`VaultStore::load`], but a missing vault yields an empty set.
    ///
    /// Used by commands that create the vault lazily on first write.
    pub fn load_or_empty(&self, password: &Password) -> Result<SecretSet> {
        match self.load(password) {
            Err(EnvCryptError::VaultNotFound(_)) => {
                tracing::info!(path = %self.path.display(), "no vault yet, starting empty");
                Ok(SecretSet::new())
            }
            other => other,
        }
    }

    /// Encrypt `secrets` and atomically replace the vault file.
    ///
    /// On failure the previously saved vault is left untouched.
    pub fn save(&self, secrets: &SecretSet, password: &Password) -> Result<()> {
        let plaintext = secrets.to_json()?;
        let envelope = encrypt(&plaintext, password, &self.kdf)?;
        storage::save(&self.path, &envelope)?;

        tracing::debug!(
            path = %self.path.display(),
            count = secrets.len(),
            "vault saved"
        );
        Ok(())
    }

    /// Returns `true` if the vault file exists.
    pub fn exists(&self) -> bool {
        storage::exists(&self.path)
    }

    /// When the vault file was last written.
    pub fn modified(&self) -> Result<DateTime<Utc>> {
        storage::modified(&self.path)
    }

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kdf_params(&self) -> &KdfParams {
        &self.kdf
    }
}
