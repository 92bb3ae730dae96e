//! Sensitive byte buffers used throughout the crypto layer.
//!
//! - [`Password`] holds the user's master password as raw bytes.
//! - [`DerivedKey`] holds the 32-byte key produced by Argon2id.
//!
//! Both types wipe their memory when dropped, on every exit path, so
//! callers never have to remember to zero them by hand.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// The master password as an owned byte buffer.
///
/// Deliberately not a `String`: it has no `Display` impl, its `Debug`
/// output is redacted, and its bytes are zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(Vec<u8>);

impl Password {
    /// Wrap raw password bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Access the raw password bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compare two passwords without leaking timing information.
    pub fn ct_eq(&self, other: &Password) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl From<Vec<u8>> for Password {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        // `into_bytes` reuses the allocation, so no stray copy is left behind.
        Self(s.into_bytes())
    }
}

impl From<&[u8]> for Password {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Zeroizing<String>> for Password {
    fn from(s: Zeroizing<String>) -> Self {
        // The `Zeroizing` wrapper wipes the original when it drops here.
        Self(s.as_bytes().to_vec())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// A 32-byte symmetric key derived from a password and salt.
///
/// Never persisted. Zeroed automatically when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Create a new `DerivedKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to key AES-GCM or HMAC).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; KEY_LEN] {
        &mut self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}
