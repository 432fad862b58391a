// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All access is serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use passtore_config::model::StoreConfig;
use passtore_core::PasstoreError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Connection options applied on open.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// Switch the journal to WAL.
    pub wal_mode: bool,
    /// How long to wait on a lock held by another process.
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&StoreConfig> for DatabaseOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            wal_mode: config.wal_mode,
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }
}

/// Handle to the credential database.
///
/// Wraps a single `tokio_rusqlite::Connection`; cloning the connection handle
/// shares the same background thread.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with default options.
    pub async fn open(path: &str) -> Result<Self, PasstoreError> {
        Self::open_with(path, &DatabaseOptions::default()).await
    }

    /// Open (or create) the database at `path`, apply PRAGMAs, run migrations.
    ///
    /// Parent directories are created as needed.
    pub async fn open_with(path: &str, options: &DatabaseOptions) -> Result<Self, PasstoreError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PasstoreError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PasstoreError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.initialize(options).await?;
        debug!(path, wal = options.wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database. WAL does not apply.
    pub async fn open_in_memory() -> Result<Self, PasstoreError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| PasstoreError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.initialize(&DatabaseOptions {
            wal_mode: false,
            ..DatabaseOptions::default()
        })
        .await?;
        Ok(db)
    }

    async fn initialize(&self, options: &DatabaseOptions) -> Result<(), PasstoreError> {
        let wal_mode = options.wal_mode;
        let busy_timeout = options.busy_timeout;
        self.conn
            .call(move |conn| -> Result<Result<(), PasstoreError>, rusqlite::Error> {
                conn.busy_timeout(busy_timeout)?;
                conn.pragma_update(None, "foreign_keys", true)?;
                if wal_mode {
                    let _mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                Ok(run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// The underlying connection, for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), PasstoreError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(|e| PasstoreError::Storage {
            source: Box::new(e),
        })?;
        debug!("database closed");
        Ok(())
    }
}

/// Convert tokio-rusqlite errors to [`PasstoreError::Storage`].
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PasstoreError {
    PasstoreError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/passtore.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();

        for table in ["credentials", "settings", "tabs"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}: {tables:?}");
        }
        assert!(path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passtore.db");
        let path = path.to_str().unwrap();

        Database::open(path).await.unwrap().close().await.unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passtore.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let mode: String = db
            .connection()
            .call(|conn| conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = Database::open_in_memory().await.unwrap();
        let result = db
            .connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO credentials (tab_id, display_order) VALUES (999, 1)",
                    [],
                )
            })
            .await;
        assert!(result.is_err());
    }
}
