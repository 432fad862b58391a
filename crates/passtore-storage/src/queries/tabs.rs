// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group (tab) CRUD operations.

use std::collections::HashSet;

use passtore_core::{PasstoreError, Tab};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};

const SELECT_TAB: &str = "SELECT id, name, color, position FROM tabs";

fn row_to_tab(row: &rusqlite::Row<'_>) -> Result<Tab, rusqlite::Error> {
    Ok(Tab {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        position: row.get(3)?,
    })
}

fn not_found(id: i64) -> PasstoreError {
    PasstoreError::RecordNotFound { entity: "tab", id }
}

pub(crate) fn tab_exists(conn: &rusqlite::Connection, id: i64) -> Result<bool, rusqlite::Error> {
    conn.query_row("SELECT 1 FROM tabs WHERE id = ?1", params![id], |_| Ok(()))
        .optional()
        .map(|row| row.is_some())
}

pub(crate) fn read_tabs(conn: &rusqlite::Connection) -> Result<Vec<Tab>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("{SELECT_TAB} ORDER BY position ASC, id ASC"))?;
    let rows = stmt.query_map([], row_to_tab)?;
    rows.collect()
}

/// List all groups ordered by position, then id.
pub async fn list_tabs(db: &Database) -> Result<Vec<Tab>, PasstoreError> {
    db.connection()
        .call(|conn| read_tabs(conn))
        .await
        .map_err(map_tr_err)
}

/// Get one group by id.
pub async fn get_tab(db: &Database, id: i64) -> Result<Option<Tab>, PasstoreError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(&format!("{SELECT_TAB} WHERE id = ?1"), params![id], row_to_tab)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Create a group at the end of the tab strip.
///
/// The first group gets position 0; later ones get max + 1.
pub async fn create_tab(db: &Database, name: &str, color: &str) -> Result<Tab, PasstoreError> {
    let name = name.to_string();
    let color = color.to_string();
    db.connection()
        .call(move |conn| -> Result<Tab, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let position: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM tabs",
                [],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO tabs (name, color, position) VALUES (?1, ?2, ?3)",
                params![name, color, position],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Tab {
                id,
                name,
                color,
                position,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Create the default group when the store has none.
///
/// Returns the created group, or `None` if groups already exist.
pub async fn ensure_default_tab(
    db: &Database,
    name: &str,
    color: &str,
) -> Result<Option<Tab>, PasstoreError> {
    let name = name.to_string();
    let color = color.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Tab>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let count: i64 = tx.query_row("SELECT COUNT(*) FROM tabs", [], |row| row.get(0))?;
            if count > 0 {
                return Ok(None);
            }
            tx.execute(
                "INSERT INTO tabs (name, color, position) VALUES (?1, ?2, 0)",
                params![name, color],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Some(Tab {
                id,
                name,
                color,
                position: 0,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Rename a group.
pub async fn rename_tab(db: &Database, id: i64, name: &str) -> Result<(), PasstoreError> {
    let name = name.to_string();
    let changed = db
        .connection()
        .call(move |conn| conn.execute("UPDATE tabs SET name = ?1 WHERE id = ?2", params![name, id]))
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Change a group's colour.
pub async fn recolor_tab(db: &Database, id: i64, color: &str) -> Result<(), PasstoreError> {
    let color = color.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute("UPDATE tabs SET color = ?1 WHERE id = ?2", params![color, id])
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Rewrite all group positions to follow `ids`.
///
/// `ids` must name every group exactly once. Positions become `0..n`.
pub async fn reorder_tabs(db: &Database, ids: &[i64]) -> Result<(), PasstoreError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<Result<(), PasstoreError>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let existing: HashSet<i64> = {
                let mut stmt = tx.prepare("SELECT id FROM tabs")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<_, _>>()?
            };
            let requested: HashSet<i64> = ids.iter().copied().collect();
            if requested.len() != ids.len() || requested != existing {
                return Ok(Err(PasstoreError::InvalidArgument(
                    "tab order must list every tab exactly once".to_string(),
                )));
            }
            for (position, id) in ids.iter().enumerate() {
                tx.execute(
                    "UPDATE tabs SET position = ?1 WHERE id = ?2",
                    params![position as i64, id],
                )?;
            }
            tx.commit()?;
            Ok(Ok(()))
        })
        .await
        .map_err(map_tr_err)?
}

/// Delete a group and every credential in it.
///
/// The last remaining group cannot be deleted. Returns the number of
/// credentials removed with the group.
pub async fn delete_tab(db: &Database, id: i64) -> Result<usize, PasstoreError> {
    db.connection()
        .call(move |conn| -> Result<Result<usize, PasstoreError>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if !tab_exists(&tx, id)? {
                return Ok(Err(not_found(id)));
            }
            let count: i64 = tx.query_row("SELECT COUNT(*) FROM tabs", [], |row| row.get(0))?;
            if count <= 1 {
                return Ok(Err(PasstoreError::GroupDeletionOnLastGroup));
            }
            let removed = tx.execute("DELETE FROM credentials WHERE tab_id = ?1", params![id])?;
            tx.execute("DELETE FROM tabs WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(Ok(removed))
        })
        .await
        .map_err(map_tr_err)?
}
