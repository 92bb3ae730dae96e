//! Crash-safe persistence of envelope bytes.
//!
//! Saving never exposes a half-written vault:
//!
//! 1. Write the bytes to a temp file in the same directory (`.<name>.tmp`).
//! 2. `fsync` the temp file and close it.
//! 3. Rename the temp file over the target path.
//! 4. `fsync` the parent directory so the rename itself is durable.
//!
//! The rename is atomic on the same filesystem, so readers see either the
//! old vault or the new one. If any step fails the temp file is removed
//! and the destination is left untouched.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::errors::{EnvCryptError, Result};

/// A fully written and synced temp file that has not yet replaced the
/// destination.
///
/// Dropping a `StagedWrite` without calling [`StagedWrite::commit`]
/// deletes the temp file and leaves the destination as it was.
#[derive(Debug)]
pub struct StagedWrite {
    tmp_path: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// Path of the temp file holding the new bytes.
    pub fn temp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Atomically move the staged bytes into place.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp_path, &self.dest).map_err(|e| write_failed(&self.dest, e))?;
        self.committed = true;

        sync_parent_dir(&self.dest);
        tracing::debug!(path = %self.dest.display(), "vault file replaced");
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

/// Write `bytes` to a sibling temp file of `path` and sync it to disk.
pub fn stage(path: &Path, bytes: &[u8]) -> Result<StagedWrite> {
    let file_name = path.file_name().ok_or_else(|| {
        write_failed(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "vault path has no file name"),
        )
    })?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    // Built before the file is opened so any early return cleans up.
    let staged = StagedWrite {
        tmp_path,
        dest: path.to_path_buf(),
        committed: false,
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(&staged.tmp_path)
        .map_err(|e| write_failed(path, e))?;

    // A stale temp file keeps its old mode, so set it explicitly.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| write_failed(path, e))?;
    }

    file.write_all(bytes).map_err(|e| write_failed(path, e))?;
    file.sync_all().map_err(|e| write_failed(path, e))?;
    drop(file);

    Ok(staged)
}

/// Atomically replace the file at `path` with `bytes`.
pub fn save(path: &Path, bytes: &[u8]) -> Result<()> {
    stage(path, bytes)?.commit()
}

/// Read the raw envelope bytes stored at `path`.
///
/// A missing file is `VaultNotFound`; anything else is `VaultReadFailed`.
pub fn load(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => EnvCryptError::VaultNotFound(path.to_path_buf()),
        _ => EnvCryptError::VaultReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Returns `true` unless the filesystem reports that `path` does not exist.
pub fn exists(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != io::ErrorKind::NotFound,
    }
}

/// Last modification time of the vault file.
pub fn modified(path: &Path) -> Result<DateTime<Utc>> {
    let meta = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => EnvCryptError::VaultNotFound(path.to_path_buf()),
        _ => EnvCryptError::VaultReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let mtime = meta.modified().map_err(|e| EnvCryptError::VaultReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(DateTime::<Utc>::from(mtime))
}

fn write_failed(path: &Path, source: io::Error) -> EnvCryptError {
    EnvCryptError::VaultWriteFailed {
        path: path.to_path_buf(),
        source,
    }
}

/// Best-effort fsync of the directory holding `path`.
fn sync_parent_dir(path: &Path) {
    #[cfg(unix)]
    {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return;
        };
        if let Err(e) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            tracing::warn!(dir = %parent.display(), error = %e, "could not fsync vault directory");
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dev.vault");

        save(&path, b"first").unwrap();
        assert_eq!(load(&path).unwrap(), b"first");

        save(&path, b"second").unwrap();
        assert_eq!(load(&path).unwrap(), b"second");
    }

    #[test]
    fn load_missing_file_is_vault_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.vault");

        let err = load(&path).unwrap_err();
        assert!(matches!(err, EnvCryptError::VaultNotFound(p) if p == path));
        assert!(!exists(&path));
    }

    #[test]
    fn load_directory_is_read_failure() {
        let dir = TempDir::new().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, EnvCryptError::VaultReadFailed { .. }));
    }

    #[test]
    fn abandoned_stage_leaves_original_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dev.vault");
        save(&path, b"original bytes").unwrap();

        let staged = stage(&path, b"replacement bytes").unwrap();
        let tmp = staged.temp_path().to_path_buf();
        assert!(tmp.exists());

        // Simulate a crash between writing the temp file and the rename.
        drop(staged);

        assert_eq!(fs::read(&path).unwrap(), b"original bytes");
        assert!(!tmp.exists(), "temp file must be cleaned up");
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the destination makes the rename fail.
        let path = dir.path().join("dev.vault");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let err = save(&path, b"data").unwrap_err();
        assert!(matches!(err, EnvCryptError::VaultWriteFailed { .. }));
        assert!(!dir.path().join(".dev.vault.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("dev.vault");
        let err = save(&path, b"data").unwrap_err();
        assert!(matches!(err, EnvCryptError::VaultWriteFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn saved_vault_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dev.vault");
        save(&path, b"data").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn modified_reports_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dev.vault");
        save(&path, b"data").unwrap();

        let ts = modified(&path).unwrap();
        assert!(ts <= Utc::now() + chrono::Duration::seconds(5));
    }
}
