//! HMAC-SHA256 integrity tag appended to every envelope.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::keys::DerivedKey;
use crate::errors::{EnvCryptError, Result};

/// Size of the HMAC tag (SHA-256 = 32 bytes).
pub const HMAC_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 over `payload`.
pub fn compute_hmac(key: &DerivedKey, payload: &[u8]) -> Result<[u8; HMAC_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| EnvCryptError::EncryptionFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(payload);

    let mut tag = [0u8; HMAC_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Check `tag` against the HMAC of `payload`.
///
/// Uses `Mac::verify_slice`, which compares in constant time.
pub fn hmac_matches(key: &DerivedKey, payload: &[u8], tag: &[u8]) -> Result<bool> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| EnvCryptError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(payload);
    Ok(mac.verify_slice(tag).is_ok())
}
