// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential CRUD operations on stored (possibly encrypted) field values.

use passtore_core::{Credential, CredentialFields, PasstoreError};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::queries::tabs::tab_exists;

const SELECT_CREDENTIAL: &str = "SELECT id, tab_id, detail, access_type, host, port, username, \
     password, role, contents, instance_type, private_ip, public_ip, row_color, display_order \
     FROM credentials";

fn row_to_credential(row: &rusqlite::Row<'_>) -> Result<Credential, rusqlite::Error> {
    Ok(Credential {
        id: row.get(0)?,
        tab_id: row.get(1)?,
        fields: CredentialFields {
            detail: row.get(2)?,
            access_type: row.get(3)?,
            host: row.get(4)?,
            port: row.get(5)?,
            username: row.get(6)?,
            password: row.get(7)?,
            role: row.get(8)?,
            contents: row.get(9)?,
            instance_type: row.get(10)?,
            private_ip: row.get(11)?,
            public_ip: row.get(12)?,
        },
        row_color: row.get(13)?,
        display_order: row.get(14)?,
        unreadable: Vec::new(),
    })
}

fn not_found(id: i64) -> PasstoreError {
    PasstoreError::RecordNotFound {
        entity: "credential",
        id,
    }
}

/// Read every stored credential, grouped by tab and in display order.
pub(crate) fn read_all(conn: &rusqlite::Connection) -> Result<Vec<Credential>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_CREDENTIAL} ORDER BY tab_id ASC, display_order ASC, id ASC"
    ))?;
    let rows = stmt.query_map([], row_to_credential)?;
    rows.collect()
}

/// Overwrite the eleven field columns of one row.
pub(crate) fn write_fields(
    conn: &rusqlite::Connection,
    id: i64,
    f: &CredentialFields,
) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "UPDATE credentials SET detail = ?1, access_type = ?2, host = ?3, port = ?4,
         username = ?5, password = ?6, role = ?7, contents = ?8, instance_type = ?9,
         private_ip = ?10, public_ip = ?11
         WHERE id = ?12",
        params![
            f.detail,
            f.access_type,
            f.host,
            f.port,
            f.username,
            f.password,
            f.role,
            f.contents,
            f.instance_type,
            f.private_ip,
            f.public_ip,
            id,
        ],
    )
}

/// Returns true when any stored field carries `prefix`.
pub(crate) fn any_field_with_prefix(
    conn: &rusqlite::Connection,
    prefix: &str,
) -> Result<bool, rusqlite::Error> {
    let pattern = format!("{prefix}%");
    conn.query_row(
        "SELECT 1 FROM credentials WHERE
         detail LIKE ?1 OR access_type LIKE ?1 OR host LIKE ?1 OR port LIKE ?1
         OR username LIKE ?1 OR password LIKE ?1 OR role LIKE ?1 OR contents LIKE ?1
         OR instance_type LIKE ?1 OR private_ip LIKE ?1 OR public_ip LIKE ?1
         LIMIT 1",
        params![pattern],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
}

/// Insert a credential at the end of its group.
///
/// The order is the group's current maximum plus one (1 for an empty group),
/// computed and inserted in one IMMEDIATE transaction.
pub async fn insert_credential(
    db: &Database,
    tab_id: i64,
    fields: &CredentialFields,
) -> Result<Credential, PasstoreError> {
    let f = fields.clone();
    db.connection()
        .call(move |conn| -> Result<Result<Credential, PasstoreError>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if !tab_exists(&tx, tab_id)? {
                return Ok(Err(PasstoreError::RecordNotFound {
                    entity: "tab",
                    id: tab_id,
                }));
            }
            let display_order: i64 = tx.query_row(
                "SELECT COALESCE(MAX(display_order), 0) + 1 FROM credentials WHERE tab_id = ?1",
                params![tab_id],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO credentials (tab_id, detail, access_type, host, port, username,
                 password, role, contents, instance_type, private_ip, public_ip, display_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    tab_id,
                    f.detail,
                    f.access_type,
                    f.host,
                    f.port,
                    f.username,
                    f.password,
                    f.role,
                    f.contents,
                    f.instance_type,
                    f.private_ip,
                    f.public_ip,
                    display_order,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Ok(Credential {
                id,
                tab_id,
                fields: f,
                row_color: None,
                display_order,
                unreadable: Vec::new(),
            }))
        })
        .await
        .map_err(map_tr_err)?
}

/// Replace the eleven fields of a credential. Group and order are untouched.
pub async fn update_credential(
    db: &Database,
    id: i64,
    fields: &CredentialFields,
) -> Result<(), PasstoreError> {
    let f = fields.clone();
    let changed = db
        .connection()
        .call(move |conn| write_fields(conn, id, &f))
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Delete a credential. The group keeps a gap in its order.
pub async fn delete_credential(db: &Database, id: i64) -> Result<(), PasstoreError> {
    let changed = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM credentials WHERE id = ?1", params![id]))
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Set or clear the row highlight colour.
pub async fn set_row_color(
    db: &Database,
    id: i64,
    color: Option<&str>,
) -> Result<(), PasstoreError> {
    let color = color.map(str::to_string);
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE credentials SET row_color = ?1 WHERE id = ?2",
                params![color, id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Get one credential by id, fields as stored.
pub async fn get_credential(db: &Database, id: i64) -> Result<Option<Credential>, PasstoreError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{SELECT_CREDENTIAL} WHERE id = ?1"),
                params![id],
                row_to_credential,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List the credentials of one group in display order, fields as stored.
pub async fn list_by_tab(db: &Database, tab_id: i64) -> Result<Vec<Credential>, PasstoreError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Credential>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_CREDENTIAL} WHERE tab_id = ?1 ORDER BY display_order ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![tab_id], row_to_credential)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// List every credential, grouped by tab id and in display order.
pub async fn list_all(db: &Database) -> Result<Vec<Credential>, PasstoreError> {
    db.connection()
        .call(|conn| read_all(conn))
        .await
        .map_err(map_tr_err)
}
