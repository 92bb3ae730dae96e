//! `.env` file parsing for `import`.

use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::errors::{EnvCryptError, Result};

/// Parse a single `.env` line into a (key, value) pair.
///
/// Returns `None` for blank lines, comments, and lines without `=`.
/// Handles: `export` prefix, double/single quotes, values with `=`.
pub fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();

    // Skip empty lines and comments.
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    // Strip optional `export ` prefix.
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);

    // Split on the first '=' to get KEY and VALUE.
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    // Strip optional surrounding quotes from the value.
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    if key.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse `.env` content into (key, value) pairs in file order.
///
/// Later duplicates are kept; inserting them in order makes the last one win.
pub fn parse_env_str(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(parse_env_line)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Read and parse a `.env` file.
pub fn parse_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    let content = Zeroizing::new(fs::read_to_string(path).map_err(|e| {
        EnvCryptError::CommandFailed(format!("failed to read {}: {e}", path.display()))
    })?);
    Ok(parse_env_str(&content))
}
