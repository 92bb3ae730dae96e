//! K-of-N threshold sharing of the master password.
//!
//! Shamir's scheme over GF(256), provided by `sharks`. Each share is
//! stored as `x ‖ y-bytes`, where `x` is the 1-based share index, so a
//! set of share files can be combined in any order.
//!
//! Share files hold the raw share bytes as base64 text with no header.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sharks::Sharks;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{EnvCryptError, Result};

/// Largest number of shares GF(256) can produce (x = 1..=255).
pub const MAX_PARTS: u8 = 255;

/// Smallest meaningful threshold and share count.
pub const MIN_THRESHOLD: u8 = 2;

/// One share of a split secret.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share(Vec<u8>);

impl Share {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(EnvCryptError::InvalidShare(
                "share must hold an x-coordinate and at least one byte".into(),
            ));
        }
        if bytes[0] == 0 {
            return Err(EnvCryptError::InvalidShare("x-coordinate 0 is not allowed".into()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The evaluation point of this share.
    pub fn index(&self) -> u8 {
        self.0[0]
    }

    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(BASE64.encode(&self.0))
    }

    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(text.trim())
            .map_err(|e| EnvCryptError::InvalidShare(format!("not valid base64: {e}")))?;
        Self::from_bytes(bytes)
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Share(index={}, [REDACTED])", self.index())
    }
}

/// Split `secret` into `parts` shares, any `threshold` of which recover it.
///
/// Requires `2 <= threshold <= parts <= 255` and a non-empty secret.
pub fn split(secret: &[u8], parts: u8, threshold: u8) -> Result<Vec<Share>> {
    if secret.is_empty() {
        return Err(EnvCryptError::InvalidShareParams(
            "cannot split an empty secret".into(),
        ));
    }
    if parts < MIN_THRESHOLD {
        return Err(EnvCryptError::InvalidShareParams(format!(
            "parts must be between {MIN_THRESHOLD} and {MAX_PARTS}, got {parts}"
        )));
    }
    if threshold < MIN_THRESHOLD || threshold > parts {
        return Err(EnvCryptError::InvalidShareParams(format!(
            "threshold must be between {MIN_THRESHOLD} and {parts}, got {threshold}"
        )));
    }

    let shares = Sharks(threshold)
        .dealer(secret)
        .take(usize::from(parts))
        .map(|share| Share(Vec::from(&share)))
        .collect::<Vec<_>>();

    tracing::info!(parts, threshold, "split secret into shares");
    Ok(shares)
}

/// Recover the secret from a set of shares.
///
/// Interpolates over every share given. With fewer shares than the
/// original threshold the result is a wrong secret, not an error: the
/// threshold is not recorded anywhere and is the caller's to enforce.
pub fn combine(shares: &[Share]) -> Result<Zeroizing<Vec<u8>>> {
    if shares.len() < usize::from(MIN_THRESHOLD) {
        return Err(EnvCryptError::InsufficientShares(shares.len()));
    }

    let len = shares[0].0.len();
    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(shares.len());

    for share in shares {
        if share.0.len() != len {
            return Err(EnvCryptError::InvalidShare(
                "shares have different lengths".into(),
            ));
        }
        if !seen.insert(share.index()) {
            return Err(EnvCryptError::InvalidShare(format!(
                "share {} was supplied more than once",
                share.index()
            )));
        }
        let s = sharks::Share::try_from(share.0.as_slice())
            .map_err(|e| EnvCryptError::InvalidShare(e.to_string()))?;
        parsed.push(s);
    }

    let secret = Sharks(MIN_THRESHOLD)
        .recover(&parsed)
        .map_err(|e| EnvCryptError::InvalidShare(e.to_string()))?;

    tracing::info!(count = shares.len(), "combined shares");
    Ok(Zeroizing::new(secret))
}

/// File name for the share with the given 1-based index.
pub fn share_file_name(index: u8) -> String {
    format!("share-{index}.txt")
}

/// Write a share as base64 text, creating parent directories.
///
/// The file is owner-only (0600) on Unix.
pub fn write_share_file(share: &Share, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(share.to_base64().as_bytes())?;
    file.sync_all()?;

    tracing::debug!(path = %path.display(), index = share.index(), "wrote share file");
    Ok(())
}

/// Read a share written by [`write_share_file`].
pub fn read_share_file(path: &Path) -> Result<Share> {
    let text = Zeroizing::new(fs::read_to_string(path).map_err(|e| {
        EnvCryptError::InvalidShare(format!("cannot read {}: {e}", path.display()))
    })?);
    Share::from_base64(&text)
}
