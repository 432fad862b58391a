// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key/value settings.

use passtore_core::PasstoreError;
use passtore_core::types::SETTING_DATA_ENCRYPTED;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Read a setting inside an existing connection or transaction.
pub(crate) fn read_setting(
    conn: &rusqlite::Connection,
    key: &str,
) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        params![key],
        |row| row.get::<_, Option<String>>(0),
    )
    .optional()
    .map(Option::flatten)
}

/// Upsert a setting inside an existing connection or transaction.
pub(crate) fn write_setting(
    conn: &rusqlite::Connection,
    key: &str,
    value: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Returns true when the encrypted-store flag reads `"true"`.
pub(crate) fn read_encrypted_flag(conn: &rusqlite::Connection) -> Result<bool, rusqlite::Error> {
    Ok(read_setting(conn, SETTING_DATA_ENCRYPTED)?.as_deref() == Some("true"))
}

/// Get a setting value.
pub async fn get_setting(db: &Database, key: &str) -> Result<Option<String>, PasstoreError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| read_setting(conn, &key))
        .await
        .map_err(map_tr_err)
}

/// Set a setting value, replacing any existing one.
pub async fn set_setting(db: &Database, key: &str, value: &str) -> Result<(), PasstoreError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| write_setting(conn, &key, &value))
        .await
        .map_err(map_tr_err)
}

/// Insert a setting only when the key is absent.
///
/// Returns the value that ended up stored: `value` if this call inserted it,
/// otherwise the value that was already there.
pub async fn insert_setting_if_absent(
    db: &Database,
    key: &str,
    value: &str,
) -> Result<String, PasstoreError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| -> Result<String, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO NOTHING",
                params![key, value],
            )?;
            let stored = read_setting(&tx, &key)?.unwrap_or(value);
            tx.commit()?;
            Ok(stored)
        })
        .await
        .map_err(map_tr_err)
}

/// Returns true when the store is flagged as encrypted.
pub async fn is_encrypted(db: &Database) -> Result<bool, PasstoreError> {
    db.connection()
        .call(|conn| read_encrypted_flag(conn))
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_setting_is_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_setting(&db, "theme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites() {
        let db = Database::open_in_memory().await.unwrap();
        set_setting(&db, "theme", "Dark").await.unwrap();
        set_setting(&db, "theme", "Light").await.unwrap();
        assert_eq!(get_setting(&db, "theme").await.unwrap().as_deref(), Some("Light"));
    }

    #[tokio::test]
    async fn insert_if_absent_keeps_first_value() {
        let db = Database::open_in_memory().await.unwrap();
        let first = insert_setting_if_absent(&db, "encryption_salt", "aaa").await.unwrap();
        let second = insert_setting_if_absent(&db, "encryption_salt", "bbb").await.unwrap();
        assert_eq!(first, "aaa");
        assert_eq!(second, "aaa");
    }

    #[tokio::test]
    async fn encrypted_flag_defaults_false() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!is_encrypted(&db).await.unwrap());
        set_setting(&db, SETTING_DATA_ENCRYPTED, "true").await.unwrap();
        assert!(is_encrypted(&db).await.unwrap());
    }
}
