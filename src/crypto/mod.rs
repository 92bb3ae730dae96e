//! Cryptographic primitives for envcrypt.
//!
//! This module provides:
//! - Zeroizing `Password` and `DerivedKey` buffers (`keys`)
//! - Argon2id password-based key derivation (`kdf`)
//! - HMAC-SHA256 envelope integrity tags (`integrity`)
//! - AES-256-GCM envelope encryption and decryption (`envelope`)

pub mod envelope;
pub mod integrity;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, Password, KdfParams, ...};
pub use envelope::{decrypt, encrypt};
pub use kdf::{derive_key, generate_salt, KdfParams, SALT_LEN};
pub use keys::{DerivedKey, Password, KEY_LEN};
