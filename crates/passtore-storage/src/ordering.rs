// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adjacent-swap reordering of credentials within a group and of groups.
//!
//! Every move reads the current order and writes the swap inside one
//! IMMEDIATE transaction, so concurrent writers never observe or produce a
//! half-swapped pair. Orders stay unique per group; gaps are allowed.

use passtore_core::{MoveDirection, PasstoreError};
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use tracing::debug;

use crate::database::{Database, map_tr_err};

/// Swap a credential with its nearest neighbour in `direction`.
///
/// Returns `false` without changing anything when the credential is already
/// at that end of its group, or is not in `tab_id`.
pub async fn move_credential(
    db: &Database,
    id: i64,
    tab_id: i64,
    direction: MoveDirection,
) -> Result<bool, PasstoreError> {
    let moved = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current: Option<i64> = tx
                .query_row(
                    "SELECT display_order FROM credentials WHERE id = ?1 AND tab_id = ?2",
                    params![id, tab_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(current) = current else {
                return Ok(false);
            };

            let neighbour_sql = match direction {
                MoveDirection::Up => {
                    "SELECT id, display_order FROM credentials
                     WHERE tab_id = ?1 AND display_order < ?2
                     ORDER BY display_order DESC, id DESC LIMIT 1"
                }
                MoveDirection::Down => {
                    "SELECT id, display_order FROM credentials
                     WHERE tab_id = ?1 AND display_order > ?2
                     ORDER BY display_order ASC, id ASC LIMIT 1"
                }
            };
            let neighbour: Option<(i64, i64)> = tx
                .query_row(neighbour_sql, params![tab_id, current], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .optional()?;
            let Some((other_id, other_order)) = neighbour else {
                return Ok(false);
            };

            tx.execute(
                "UPDATE credentials SET display_order = ?1 WHERE id = ?2",
                params![other_order, id],
            )?;
            tx.execute(
                "UPDATE credentials SET display_order = ?1 WHERE id = ?2",
                params![current, other_id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)?;
    debug!(id, tab_id, %direction, moved, "credential move");
    Ok(moved)
}

/// Move a credential one place towards the top of its group.
pub async fn move_up(db: &Database, id: i64, tab_id: i64) -> Result<bool, PasstoreError> {
    move_credential(db, id, tab_id, MoveDirection::Up).await
}

/// Move a credential one place towards the bottom of its group.
pub async fn move_down(db: &Database, id: i64, tab_id: i64) -> Result<bool, PasstoreError> {
    move_credential(db, id, tab_id, MoveDirection::Down).await
}

/// Renumber a group to `1..=n`, keeping its current order.
///
/// Returns how many rows changed order.
pub async fn compact(db: &Database, tab_id: i64) -> Result<usize, PasstoreError> {
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let rows: Vec<(i64, i64)> = {
                let mut stmt = tx.prepare(
                    "SELECT id, display_order FROM credentials
                     WHERE tab_id = ?1 ORDER BY display_order ASC, id ASC",
                )?;
                let rows = stmt.query_map(params![tab_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
                rows.collect::<Result<_, _>>()?
            };
            let mut changed = 0;
            for (index, (id, order)) in rows.iter().enumerate() {
                let wanted = index as i64 + 1;
                if *order != wanted {
                    tx.execute(
                        "UPDATE credentials SET display_order = ?1 WHERE id = ?2",
                        params![wanted, id],
                    )?;
                    changed += 1;
                }
            }
            tx.commit()?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Swap a group with its neighbour in the tab strip.
///
/// `Up` moves it left, `Down` moves it right. Returns `false` at either end
/// or for an unknown id.
pub async fn move_tab(
    db: &Database,
    id: i64,
    direction: MoveDirection,
) -> Result<bool, PasstoreError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current: Option<i64> = tx
                .query_row(
                    "SELECT position FROM tabs WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(current) = current else {
                return Ok(false);
            };

            let neighbour_sql = match direction {
                MoveDirection::Up => {
                    "SELECT id, position FROM tabs WHERE position < ?1
                     ORDER BY position DESC, id DESC LIMIT 1"
                }
                MoveDirection::Down => {
                    "SELECT id, position FROM tabs WHERE position > ?1
                     ORDER BY position ASC, id ASC LIMIT 1"
                }
            };
            let neighbour: Option<(i64, i64)> = tx
                .query_row(neighbour_sql, params![current], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .optional()?;
            let Some((other_id, other_position)) = neighbour else {
                return Ok(false);
            };

            tx.execute(
                "UPDATE tabs SET position = ?1 WHERE id = ?2",
                params![other_position, id],
            )?;
            tx.execute(
                "UPDATE tabs SET position = ?1 WHERE id = ?2",
                params![current, other_id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}
