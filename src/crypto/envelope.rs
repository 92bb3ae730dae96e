//! Password-based envelope encryption: Argon2id + AES-256-GCM + HMAC.
//!
//! Every call to [`encrypt`] draws a fresh salt and a fresh nonce, so no
//! (key, nonce) pair is ever reused.
//!
//! Layout of an envelope:
//!
//! ```text
//! [ 16-byte salt | 12-byte nonce | ciphertext + 16-byte GCM tag | 32-byte HMAC-SHA256 ]
//! ```
//!
//! The HMAC covers everything before it and is keyed with the same
//! derived key.  Envelopes written before the HMAC suffix existed are
//! still readable: [`decrypt`] only strips the suffix when it verifies.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use super::integrity::{compute_hmac, hmac_matches, HMAC_LEN};
use super::kdf::{derive_key, generate_salt, KdfParams, SALT_LEN};
use super::keys::{DerivedKey, Password};
use crate::errors::{EnvCryptError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under a key derived from `password`.
///
/// Returns the full envelope (salt, nonce, ciphertext, HMAC).
pub fn encrypt(plaintext: &[u8], password: &Password, params: &KdfParams) -> Result<Vec<u8>> {
    let salt = generate_salt()?;
    let key = derive_key(password, &salt, params)?;

    let mut envelope = seal(&key, &salt, plaintext)?;
    let tag = compute_hmac(&key, &envelope)?;
    envelope.extend_from_slice(&tag);

    tracing::debug!(bytes = envelope.len(), "sealed vault envelope");
    Ok(envelope)
}

/// Decrypt an envelope produced by [`encrypt`] (or a legacy one without
/// the HMAC suffix).
///
/// A wrong password and a tampered ciphertext are indistinguishable:
/// both surface as `DecryptionFailed`.
pub fn decrypt(
    envelope: &[u8],
    password: &Password,
    params: &KdfParams,
) -> Result<Zeroizing<Vec<u8>>> {
    if envelope.len() < SALT_LEN {
        return Err(EnvCryptError::InvalidVaultData);
    }

    let salt: &[u8; SALT_LEN] = envelope[..SALT_LEN]
        .try_into()
        .map_err(|_| EnvCryptError::InvalidVaultData)?;
    let key = derive_key(password, salt, params)?;

    let payload = strip_hmac(&key, envelope)?;

    let sealed = &payload[SALT_LEN..];
    if sealed.len() < NONCE_LEN {
        return Err(EnvCryptError::CiphertextTooShort);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| EnvCryptError::DecryptionFailed)?;

    // Decrypt and verify the GCM tag (no associated data).
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| EnvCryptError::DecryptionFailed)?;

    Ok(Zeroizing::new(plaintext))
}

/// AEAD-seal `plaintext` and prefix it with the salt and nonce.
///
/// This is the whole legacy envelope; [`encrypt`] appends the HMAC.
fn seal(key: &DerivedKey, salt: &[u8; SALT_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| EnvCryptError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    // A plain `&[u8]` payload authenticates empty associated data.
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| EnvCryptError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len() + HMAC_LEN);
    out.extend_from_slice(salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Return the payload covered by the HMAC suffix when it verifies,
/// otherwise the whole envelope (legacy format).
///
/// A corrupted HMAC therefore falls through to the AEAD check, which
/// then fails with `DecryptionFailed`.
fn strip_hmac<'a>(key: &DerivedKey, envelope: &'a [u8]) -> Result<&'a [u8]> {
    if envelope.len() <= SALT_LEN + HMAC_LEN {
        return Ok(envelope);
    }

    let (payload, tag) = envelope.split_at(envelope.len() - HMAC_LEN);
    if hmac_matches(key, payload, tag)? {
        Ok(payload)
    } else {
        tracing::debug!("HMAC suffix did not verify, reading envelope as legacy format");
        Ok(envelope)
    }
}
