// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-time plaintext-to-ciphertext migration and master-key rotation.
//!
//! Both operations rewrite every credential row and the relevant settings
//! inside a single IMMEDIATE transaction: they either finish completely or
//! leave the store exactly as it was.

use passtore_core::types::{SETTING_DATA_ENCRYPTED, SETTING_MASTER_HASH};
use passtore_core::{CredentialField, PasstoreError};
use passtore_vault::{EncryptionContext, TOKEN_PREFIX, is_token};
use rusqlite::TransactionBehavior;
use tracing::{info, warn};

use crate::database::{Database, map_tr_err};
use crate::queries::credentials::{any_field_with_prefix, read_all, write_fields};
use crate::queries::settings::{read_encrypted_flag, read_setting, write_setting};

/// Outcome of [`migrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// The store was already flagged as encrypted; nothing was written.
    pub already_applied: bool,
    /// Credential rows rewritten.
    pub records: usize,
    /// Individual field values encrypted.
    pub fields: usize,
}

/// Encrypt every stored credential field and flag the store as encrypted.
///
/// A store that is already flagged is left untouched and reported with
/// `already_applied = true`. Values that already decrypt under `ctx` are kept
/// as they are, so a value is never encrypted twice.
pub async fn migrate(
    db: &Database,
    ctx: &EncryptionContext,
) -> Result<MigrationReport, PasstoreError> {
    let ctx = ctx.clone();
    let report = db
        .connection()
        .call(move |conn| -> Result<Result<MigrationReport, PasstoreError>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if read_encrypted_flag(&tx)? {
                return Ok(Ok(MigrationReport {
                    already_applied: true,
                    records: 0,
                    fields: 0,
                }));
            }

            let rows = read_all(&tx)?;
            let mut records = 0;
            let mut fields = 0;
            for row in &rows {
                let mut encrypted_fields = 0;
                let encrypted = row.fields.try_map(|_, value| {
                    if value.is_empty() || (is_token(value) && ctx.decrypt(value).is_ok()) {
                        return Ok(value.to_string());
                    }
                    encrypted_fields += 1;
                    ctx.encrypt(value)
                });
                let encrypted = match encrypted {
                    Ok(encrypted) => encrypted,
                    Err(e) => return Ok(Err(e)),
                };
                if encrypted_fields > 0 {
                    write_fields(&tx, row.id, &encrypted)?;
                    records += 1;
                    fields += encrypted_fields;
                }
            }

            write_setting(&tx, SETTING_DATA_ENCRYPTED, "true")?;
            tx.commit()?;
            Ok(Ok(MigrationReport {
                already_applied: false,
                records,
                fields,
            }))
        })
        .await
        .map_err(map_tr_err)??;

    if report.already_applied {
        info!("store already encrypted, migration skipped");
    } else {
        info!(
            records = report.records,
            fields = report.fields,
            "store migrated to encrypted fields"
        );
    }
    Ok(report)
}

/// Recover a missing encrypted-store flag by inspecting stored values.
///
/// When the flag setting is absent and any field carries the token prefix,
/// the flag is recorded as `"true"`. Returns whether the flag was written.
pub async fn infer_encryption_flag(db: &Database) -> Result<bool, PasstoreError> {
    let inferred = db
        .connection()
        .call(|conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if read_setting(&tx, SETTING_DATA_ENCRYPTED)?.is_some() {
                return Ok(false);
            }
            if !any_field_with_prefix(&tx, TOKEN_PREFIX)? {
                return Ok(false);
            }
            write_setting(&tx, SETTING_DATA_ENCRYPTED, "true")?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)?;

    if inferred {
        warn!("encrypted-store flag was missing; restored from stored token format");
    }
    Ok(inferred)
}

/// Re-encrypt every field from `old` to `new` and store `new_master_hash`.
///
/// On a store not yet flagged as encrypted only the verifier is replaced.
/// Any field that fails to decrypt under `old` aborts the whole rotation.
/// Returns the number of rows rewritten.
pub async fn rekey(
    db: &Database,
    old: &EncryptionContext,
    new: &EncryptionContext,
    new_master_hash: &str,
) -> Result<usize, PasstoreError> {
    let old = old.clone();
    let new = new.clone();
    let new_master_hash = new_master_hash.to_string();
    let records = db
        .connection()
        .call(move |conn| -> Result<Result<usize, PasstoreError>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut records = 0;
            if read_encrypted_flag(&tx)? {
                for row in read_all(&tx)? {
                    let rotated = row.fields.try_map(|field: CredentialField, value| {
                        let plaintext = old.decrypt(value).map_err(|e| e.for_field(field.as_ref()))?;
                        new.encrypt(&plaintext)
                    });
                    let rotated = match rotated {
                        Ok(rotated) => rotated,
                        Err(e) => return Ok(Err(e)),
                    };
                    write_fields(&tx, row.id, &rotated)?;
                    records += 1;
                }
            }
            write_setting(&tx, SETTING_MASTER_HASH, &new_master_hash)?;
            tx.commit()?;
            Ok(Ok(records))
        })
        .await
        .map_err(map_tr_err)??;

    info!(records, "master key rotated");
    Ok(records)
}
