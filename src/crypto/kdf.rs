//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  Parameters come from `Settings` (the `[argon2]`
//! table of the config files) and are validated once, when the
//! configuration is loaded, by [`KdfParams::new`].

use argon2::{Algorithm, Argon2, Params, Version};
use rand::TryRngCore;

use super::keys::{DerivedKey, Password, KEY_LEN};
use crate::errors::{EnvCryptError, Result};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Default memory cost in KiB (64 MB).
pub const DEFAULT_MEMORY_KIB: u32 = 65_536;

/// Default number of passes over memory.
pub const DEFAULT_ITERATIONS: u32 = 1;

/// Default number of parallel lanes.
pub const DEFAULT_PARALLELISM: u32 = 4;

/// Validated Argon2id cost parameters.
///
/// The only way to build a non-default value is [`KdfParams::new`], so a
/// `KdfParams` in hand is always accepted by the argon2 backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl KdfParams {
    /// Validate and build a parameter set.
    ///
    /// Rejects zero values and memory below 8 MB. Errors are reported as
    /// `ConfigError` because they originate in user configuration.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        if memory_kib < MIN_MEMORY_KIB {
            return Err(EnvCryptError::ConfigError(format!(
                "argon2 memory must be at least {MIN_MEMORY_KIB} KiB (got {memory_kib})"
            )));
        }
        if iterations < 1 {
            return Err(EnvCryptError::ConfigError(
                "argon2 iterations must be at least 1".into(),
            ));
        }
        if parallelism < 1 {
            return Err(EnvCryptError::ConfigError(
                "argon2 parallelism must be at least 1".into(),
            ));
        }

        // Let argon2 apply its own bounds (e.g. memory >= 8 * lanes).
        Params::new(memory_kib, iterations, parallelism, Some(KEY_LEN))
            .map_err(|e| EnvCryptError::ConfigError(format!("invalid argon2 params: {e}")))?;

        Ok(Self {
            memory_kib,
            iterations,
            parallelism,
        })
    }

    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }
}

/// Derive a 32-byte key from a password and salt with Argon2id.
///
/// The same password + salt + params always produce the same key.
pub fn derive_key(
    password: &Password,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<DerivedKey> {
    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| EnvCryptError::KeyDerivationFailed(format!("invalid argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    // Hash straight into the key buffer; on error it is wiped on drop.
    let mut key = DerivedKey::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, key.as_mut_bytes())
        .map_err(|e| EnvCryptError::KeyDerivationFailed(format!("argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 16-byte salt from the OS RNG.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| EnvCryptError::EncryptionFailed(format!("OS random source failed: {e}")))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> KdfParams {
        KdfParams::new(MIN_MEMORY_KIB, 1, 1).unwrap()
    }

    #[test]
    fn defaults_match_documented_values() {
        let p = KdfParams::default();
        assert_eq!(p.memory_kib(), 65_536);
        assert_eq!(p.iterations(), 1);
        assert_eq!(p.parallelism(), 4);
    }

    #[test]
    fn same_inputs_same_key() {
        let pw = Password::from("correct horse");
        let salt = [7u8; SALT_LEN];
        let a = derive_key(&pw, &salt, &fast_params()).unwrap();
        let b = derive_key(&pw, &salt, &fast_params()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salts_different_keys() {
        let pw = Password::from("correct horse");
        let a = derive_key(&pw, &[1u8; SALT_LEN], &fast_params()).unwrap();
        let b = derive_key(&pw, &[2u8; SALT_LEN], &fast_params()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_params_different_keys() {
        let pw = Password::from("correct horse");
        let salt = [3u8; SALT_LEN];
        let a = derive_key(&pw, &salt, &fast_params()).unwrap();
        let b = derive_key(&pw, &salt, &KdfParams::new(MIN_MEMORY_KIB, 2, 1).unwrap()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn rejects_weak_or_zero_params() {
        assert!(KdfParams::new(1024, 1, 1).is_err());
        assert!(KdfParams::new(MIN_MEMORY_KIB, 0, 1).is_err());
        assert!(KdfParams::new(MIN_MEMORY_KIB, 1, 0).is_err());
    }

    #[test]
    fn salts_are_random() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
    }
}
