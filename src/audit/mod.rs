//! Audit log: SQLite-backed history of store operations.
//!
//! Every mutating command (add, update, revert, delete, migrate, init)
//! appends a row to `audit.db`, which lives next to the secrets file.
//! Secret values are never recorded, only names and short details.
//!
//! Writes are fire-and-forget: if the database can't be opened or
//! written to, the command carries on without logging.  Built only with
//! the `audit-log` feature; without it `log_audit` is a no-op.

#[cfg(feature = "audit-log")]
use std::path::{Path, PathBuf};

#[cfg(feature = "audit-log")]
use chrono::{DateTime, Utc};
#[cfg(feature = "audit-log")]
use rusqlite::Connection;

use crate::cli::Context;
#[cfg(feature = "audit-log")]
use crate::errors::{LockboxError, Result};

/// File name of the audit database.
pub const AUDIT_DB_NAME: &str = "audit.db";

/// A single audit log row.
#[cfg(feature = "audit-log")]
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub environment: String,
    pub user: String,
    pub secret_name: Option<String>,
    pub details: Option<String>,
}

#[cfg(feature = "audit-log")]
pub struct AuditLog {
    conn: Connection,
}

#[cfg(feature = "audit-log")]
impl AuditLog {
    /// Open (or create) `<data_dir>/audit.db`.
    ///
    /// Returns `None` when the database is unavailable.
    pub fn open(data_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(data_dir);
        let conn = Connection::open(&db_path).ok()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                environment TEXT NOT NULL,
                user        TEXT NOT NULL,
                secret_name TEXT,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Append a row.  Errors are dropped.
    pub fn log(
        &self,
        operation: &str,
        environment: &str,
        user: &str,
        secret_name: Option<&str>,
        details: Option<&str>,
    ) {
        let now = Utc::now().to_rfc3339();
        if let Err(e) = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, environment, user, secret_name, details)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![now, operation, environment, user, secret_name, details],
        ) {
            tracing::debug!(error = %e, operation, "audit insert failed");
        }
    }

    /// Most recent entries first, at most `limit`, optionally only those at
    /// or after `since`.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        // RFC 3339 strings from the same writer sort chronologically.
        let since = since.map(|ts| ts.to_rfc3339());

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, environment, user, secret_name, details
                 FROM audit_log
                 WHERE ?1 IS NULL OR timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| LockboxError::Audit(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since, limit], |row| {
                let ts: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    operation: row.get(2)?,
                    environment: row.get(3)?,
                    user: row.get(4)?,
                    secret_name: row.get(5)?,
                    details: row.get(6)?,
                })
            })
            .map_err(|e| LockboxError::Audit(format!("query exec: {e}")))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LockboxError::Audit(format!("row parse: {e}")))
    }

    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join(AUDIT_DB_NAME)
    }
}

/// Record an operation against the store the CLI context points at.
///
/// Never fails the calling command.
#[cfg(feature = "audit-log")]
pub fn log_audit(ctx: &Context, op: &str, secret: Option<&str>, details: Option<&str>) {
    if let Some(audit) = AuditLog::open(ctx.data_dir()) {
        audit.log(
            op,
            ctx.settings.environment.as_str(),
            &ctx.settings.app_user,
            secret,
            details,
        );
    }
}

#[cfg(not(feature = "audit-log"))]
pub fn log_audit(_ctx: &Context, _op: &str, _secret: Option<&str>, _details: Option<&str>) {}
