//! The plaintext secret mapping stored inside a vault.
//!
//! A `SecretSet` maps environment-variable names to values. It is
//! serialized as a JSON object (sorted by key, so the output is
//! canonical) before being encrypted into an envelope.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{EnvCryptError, Result};

/// Validate a secret key.
///
/// A key must be non-empty and must not contain `=`, since it becomes
/// the name half of a `NAME=value` environment entry.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(EnvCryptError::EmptyKey);
    }
    if key.contains('=') {
        return Err(EnvCryptError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Key → value mapping of decrypted secrets.
///
/// Every key and value is zeroed when the set is dropped, and values
/// replaced or removed through its methods are zeroed immediately.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretSet {
    entries: BTreeMap<String, String>,
}

impl SecretSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a secret. Returns `true` if an existing value was replaced.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<bool> {
        validate_key(key)?;
        match self.entries.insert(key.to_string(), value.to_string()) {
            Some(mut old) => {
                old.zeroize();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove a secret. Returns `true` if it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove_entry(key) {
            Some((mut k, mut v)) => {
                k.zeroize();
                v.zeroize();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Secret names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize to the JSON object that forms the envelope plaintext.
    pub fn to_json(&self) -> Result<Zeroizing<Vec<u8>>> {
        serde_json::to_vec(&self.entries)
            .map(Zeroizing::new)
            .map_err(|e| EnvCryptError::SerializationError(format!("secrets: {e}")))
    }

    /// Parse the JSON object produced by [`SecretSet::to_json`].
    ///
    /// Entries whose key could not be an environment variable name (empty,
    /// or containing `=`) are dropped with a warning.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let mut entries: BTreeMap<String, String> = serde_json::from_slice(bytes)
            .map_err(|e| EnvCryptError::SerializationError(format!("vault contents: {e}")))?;

        let before = entries.len();
        entries.retain(|k, v| {
            if validate_key(k).is_ok() {
                return true;
            }
            v.zeroize();
            false
        });
        if entries.len() < before {
            tracing::warn!(
                skipped = before - entries.len(),
                "vault holds entries with invalid key names; skipping them"
            );
        }

        Ok(Self { entries })
    }
}

impl Drop for SecretSet {
    fn drop(&mut self) {
        for (mut k, mut v) in std::mem::take(&mut self.entries) {
            k.zeroize();
            v.zeroize();
        }
    }
}

impl fmt::Debug for SecretSet {
    // Names only; values never reach logs or panic messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
