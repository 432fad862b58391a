// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password commands: `init`, `migrate`, `change-password`, and the
//! unlock step shared by commands that touch credential fields.

use passtore_core::PasstoreError;
use passtore_storage::{MigrationReport, Session};
use passtore_vault::{get_master_password, get_master_password_with_confirm};

fn print_report(report: &MigrationReport) {
    if report.already_applied {
        eprintln!("store already encrypted");
    } else {
        eprintln!(
            "encrypted {} field(s) in {} credential(s)",
            report.fields, report.records
        );
    }
}

/// Unlock the session when the store has a master password.
///
/// A store without one is still plaintext and needs no key.
pub async fn unlock(session: &Session) -> Result<(), PasstoreError> {
    if !session.has_master_password().await? {
        if session.is_store_encrypted().await? {
            return Err(PasstoreError::Locked);
        }
        return Ok(());
    }
    let password = get_master_password("Master password")?;
    if let Some(report) = session.unlock(&password).await? {
        print_report(&report);
    }
    Ok(())
}

/// `passtore init`
pub async fn run_init(session: &Session) -> Result<(), PasstoreError> {
    if session.has_master_password().await? {
        return Err(PasstoreError::MasterPasswordAlreadySet);
    }
    let password = get_master_password_with_confirm("New master password")?;
    let report = session.setup_master_password(&password).await?;
    if let Some(report) = report {
        print_report(&report);
    }
    println!("master password set");
    Ok(())
}

/// `passtore migrate`
pub async fn run_migrate(session: &Session) -> Result<(), PasstoreError> {
    if !session.has_master_password().await? {
        return Err(PasstoreError::InvalidArgument(
            "no master password set; run `passtore init` first".to_string(),
        ));
    }
    unlock(session).await?;
    let report = session.run_migration().await?;
    print_report(&report);
    Ok(())
}

/// `passtore change-password`
pub async fn run_change_password(session: &Session) -> Result<(), PasstoreError> {
    let current = get_master_password("Current master password")?;
    if !session.verify_master_password(&current).await? {
        return Err(PasstoreError::InvalidMasterPassword);
    }
    let new = get_master_password_with_confirm("New master password")?;
    let records = session.change_master_password(&current, &new).await?;
    println!("master password changed ({records} credential(s) re-encrypted)");
    Ok(())
}
