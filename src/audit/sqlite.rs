//! SQLite storage for audit entries.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::errors::{EnvCryptError, Result};

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub environment: String,
    pub vault_path: String,
    pub key: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

/// A record about to be written.
#[derive(Debug, Clone, Copy)]
pub struct NewEntry<'a> {
    pub action: &'a str,
    pub environment: &'a str,
    pub vault_path: &'a str,
    pub key: Option<&'a str>,
    pub error: Option<&'a str>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `db_path`.
    ///
    /// Parent directories are created. The database is owner-only on Unix.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| EnvCryptError::AuditError(format!("open {}: {e}", db_path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                action      TEXT NOT NULL,
                environment TEXT NOT NULL,
                vault_path  TEXT NOT NULL,
                key         TEXT,
                success     INTEGER NOT NULL,
                error       TEXT
            );",
        )
        .map_err(|e| EnvCryptError::AuditError(format!("create table: {e}")))?;

        Ok(Self { conn })
    }

    /// Append one entry. `success` is derived from `entry.error`.
    pub fn append(&self, entry: &NewEntry<'_>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO audit_log
                    (timestamp, action, environment, vault_path, key, success, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    now,
                    entry.action,
                    entry.environment,
                    entry.vault_path,
                    entry.key,
                    entry.error.is_none(),
                    entry.error,
                ],
            )
            .map_err(|e| EnvCryptError::AuditError(format!("insert: {e}")))?;
        Ok(())
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, environment, vault_path, key, success, error
                 FROM audit_log
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(|e| EnvCryptError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map([limit], |row| {
                let ts: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .map_or_else(|_| DateTime::<Utc>::UNIX_EPOCH, |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    action: row.get(2)?,
                    environment: row.get(3)?,
                    vault_path: row.get(4)?,
                    key: row.get(5)?,
                    success: row.get(6)?,
                    error: row.get(7)?,
                })
            })
            .map_err(|e| EnvCryptError::AuditError(format!("query exec: {e}")))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| EnvCryptError::AuditError(format!("row parse: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry<'a>(action: &'a str, key: Option<&'a str>, error: Option<&'a str>) -> NewEntry<'a> {
        NewEntry {
            action,
            environment: "dev",
            vault_path: "/tmp/project/.envcrypt/dev.vault",
            key,
            error,
        }
    }

    #[test]
    fn open_creates_database_and_parents() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("nested").join("audit.db");
        AuditLog::open(&db).unwrap();
        assert!(db.exists());
    }

    #[test]
    fn append_and_read_back_newest_first() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(&dir.path().join("audit.db")).unwrap();

        log.append(&entry("set", Some("DB_URL"), None)).unwrap();
        log.append(&entry("get", Some("MISSING"), Some("secret not found"))).unwrap();
        log.append(&entry("list", None, None)).unwrap();

        let entries = log.recent(10).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].action, "list");
        assert!(entries[0].key.is_none());

        assert_eq!(entries[1].action, "get");
        assert!(!entries[1].success);
        assert_eq!(entries[1].error.as_deref(), Some("secret not found"));

        assert_eq!(entries[2].key.as_deref(), Some("DB_URL"));
        assert!(entries[2].success);
        assert_eq!(entries[2].vault_path, "/tmp/project/.envcrypt/dev.vault");
    }

    #[test]
    fn recent_honours_limit() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(&dir.path().join("audit.db")).unwrap();
        for _ in 0..10 {
            log.append(&entry("set", Some("K"), None)).unwrap();
        }
        assert_eq!(log.recent(3).unwrap().len(), 3);
    }

    #[test]
    fn open_fails_on_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();
        assert!(AuditLog::open(&file.join("audit.db")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn audit_db_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let db = dir.path().join("audit.db");
        AuditLog::open(&db).unwrap();

        let mode = std::fs::metadata(&db).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
