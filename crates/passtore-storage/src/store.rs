// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential store: record-level API with transparent field encryption.
//!
//! Every method takes an optional [`EncryptionContext`]. With a context,
//! fields are encrypted before they are written and decrypted after they are
//! read; without one they pass through as stored.

use std::collections::HashMap;
use std::str::FromStr;

use passtore_core::types::SETTING_THEME;
use passtore_core::{
    Credential, CredentialFields, DecryptFailurePolicy, MoveDirection, PasstoreError, Tab, Theme,
};
use passtore_vault::{EncryptionContext, decrypt_record, encrypt_record};
use tracing::{debug, info};

use crate::database::Database;
use crate::encryption::{self, MigrationReport};
use crate::ordering;
use crate::queries::{credentials, settings, tabs};

/// Record store over one database handle.
pub struct CredentialStore {
    db: Database,
    policy: DecryptFailurePolicy,
}

impl CredentialStore {
    /// Wrap an open database.
    pub fn new(db: Database, policy: DecryptFailurePolicy) -> Self {
        Self { db, policy }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Policy applied to fields that fail to decrypt.
    pub fn policy(&self) -> DecryptFailurePolicy {
        self.policy
    }

    /// Close the underlying database.
    pub async fn close(self) -> Result<(), PasstoreError> {
        self.db.close().await
    }

    fn seal(
        ctx: Option<&EncryptionContext>,
        fields: &CredentialFields,
    ) -> Result<CredentialFields, PasstoreError> {
        match ctx {
            Some(ctx) => encrypt_record(ctx, fields),
            None => Ok(fields.clone()),
        }
    }

    fn open(
        &self,
        ctx: Option<&EncryptionContext>,
        mut credential: Credential,
    ) -> Result<Credential, PasstoreError> {
        if let Some(ctx) = ctx {
            let decrypted = decrypt_record(ctx, &credential.fields, self.policy)?;
            credential.fields = decrypted.fields;
            credential.unreadable = decrypted.unreadable;
        }
        Ok(credential)
    }

    // --- Credentials ---

    /// Add a credential at the end of `tab_id`.
    ///
    /// The returned record carries the plaintext fields passed in.
    pub async fn add(
        &self,
        tab_id: i64,
        fields: &CredentialFields,
        ctx: Option<&EncryptionContext>,
    ) -> Result<Credential, PasstoreError> {
        let stored = Self::seal(ctx, fields)?;
        let mut credential = credentials::insert_credential(&self.db, tab_id, &stored).await?;
        credential.fields = fields.clone();
        debug!(id = credential.id, tab_id, order = credential.display_order, "credential added");
        Ok(credential)
    }

    /// Replace the eleven fields of a credential.
    pub async fn update(
        &self,
        id: i64,
        fields: &CredentialFields,
        ctx: Option<&EncryptionContext>,
    ) -> Result<(), PasstoreError> {
        let stored = Self::seal(ctx, fields)?;
        credentials::update_credential(&self.db, id, &stored).await?;
        debug!(id, "credential updated");
        Ok(())
    }

    /// Delete a credential.
    pub async fn delete(&self, id: i64) -> Result<(), PasstoreError> {
        credentials::delete_credential(&self.db, id).await?;
        debug!(id, "credential deleted");
        Ok(())
    }

    /// Get one credential.
    pub async fn get(
        &self,
        id: i64,
        ctx: Option<&EncryptionContext>,
    ) -> Result<Option<Credential>, PasstoreError> {
        credentials::get_credential(&self.db, id)
            .await?
            .map(|c| self.open(ctx, c))
            .transpose()
    }

    /// Credentials of one group, ordered by display order then id.
    pub async fn get_by_group(
        &self,
        tab_id: i64,
        ctx: Option<&EncryptionContext>,
    ) -> Result<Vec<Credential>, PasstoreError> {
        credentials::list_by_tab(&self.db, tab_id)
            .await?
            .into_iter()
            .map(|c| self.open(ctx, c))
            .collect()
    }

    /// Every group in tab order, each with its ordered credentials.
    pub async fn list_all(
        &self,
        ctx: Option<&EncryptionContext>,
    ) -> Result<Vec<(Tab, Vec<Credential>)>, PasstoreError> {
        let groups = tabs::list_tabs(&self.db).await?;
        let mut by_tab: HashMap<i64, Vec<Credential>> = HashMap::new();
        for credential in credentials::list_all(&self.db).await? {
            let credential = self.open(ctx, credential)?;
            by_tab.entry(credential.tab_id).or_default().push(credential);
        }
        Ok(groups
            .into_iter()
            .map(|tab| {
                let creds = by_tab.remove(&tab.id).unwrap_or_default();
                (tab, creds)
            })
            .collect())
    }

    /// Set or clear a credential's row colour.
    pub async fn set_row_color(&self, id: i64, color: Option<&str>) -> Result<(), PasstoreError> {
        credentials::set_row_color(&self.db, id, color).await
    }

    /// Move a credential one place up within its group.
    pub async fn move_up(&self, id: i64, tab_id: i64) -> Result<bool, PasstoreError> {
        ordering::move_up(&self.db, id, tab_id).await
    }

    /// Move a credential one place down within its group.
    pub async fn move_down(&self, id: i64, tab_id: i64) -> Result<bool, PasstoreError> {
        ordering::move_down(&self.db, id, tab_id).await
    }

    /// Renumber a group's orders to `1..=n`.
    pub async fn compact(&self, tab_id: i64) -> Result<usize, PasstoreError> {
        ordering::compact(&self.db, tab_id).await
    }

    // --- Groups ---

    /// All groups ordered by position, then id.
    pub async fn list_tabs(&self) -> Result<Vec<Tab>, PasstoreError> {
        tabs::list_tabs(&self.db).await
    }

    /// Get one group.
    pub async fn get_tab(&self, id: i64) -> Result<Option<Tab>, PasstoreError> {
        tabs::get_tab(&self.db, id).await
    }

    /// Create a group at the end of the tab strip.
    pub async fn create_tab(&self, name: &str, color: &str) -> Result<Tab, PasstoreError> {
        let tab = tabs::create_tab(&self.db, name, color).await?;
        debug!(id = tab.id, position = tab.position, "tab created");
        Ok(tab)
    }

    pub async fn rename_tab(&self, id: i64, name: &str) -> Result<(), PasstoreError> {
        tabs::rename_tab(&self.db, id, name).await
    }

    pub async fn recolor_tab(&self, id: i64, color: &str) -> Result<(), PasstoreError> {
        tabs::recolor_tab(&self.db, id, color).await
    }

    /// Rewrite group positions to follow `ids`, which must name every group once.
    pub async fn reorder_tabs(&self, ids: &[i64]) -> Result<(), PasstoreError> {
        tabs::reorder_tabs(&self.db, ids).await
    }

    /// Swap a group with its neighbour.
    pub async fn move_tab(&self, id: i64, direction: MoveDirection) -> Result<bool, PasstoreError> {
        ordering::move_tab(&self.db, id, direction).await
    }

    /// Delete a group and its credentials. The last group cannot be deleted.
    pub async fn delete_tab(&self, id: i64) -> Result<usize, PasstoreError> {
        let removed = tabs::delete_tab(&self.db, id).await?;
        info!(id, credentials = removed, "tab deleted");
        Ok(removed)
    }

    /// Create the default group when none exist.
    pub async fn ensure_default_tab(
        &self,
        name: &str,
        color: &str,
    ) -> Result<Option<Tab>, PasstoreError> {
        let created = tabs::ensure_default_tab(&self.db, name, color).await?;
        if let Some(tab) = &created {
            info!(id = tab.id, name = %tab.name, "default tab created");
        }
        Ok(created)
    }

    // --- Settings ---

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, PasstoreError> {
        settings::get_setting(&self.db, key).await
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<(), PasstoreError> {
        settings::set_setting(&self.db, key, value).await
    }

    /// Insert a setting unless present; returns the stored value.
    pub async fn insert_setting_if_absent(
        &self,
        key: &str,
        value: &str,
    ) -> Result<String, PasstoreError> {
        settings::insert_setting_if_absent(&self.db, key, value).await
    }

    /// Whether the store is flagged as encrypted.
    pub async fn is_encrypted(&self) -> Result<bool, PasstoreError> {
        settings::is_encrypted(&self.db).await
    }

    /// The persisted theme, or `default` when unset or unrecognised.
    pub async fn theme(&self, default: Theme) -> Result<Theme, PasstoreError> {
        let stored = self.get_setting(SETTING_THEME).await?;
        Ok(stored
            .and_then(|name| Theme::from_str(&name).ok())
            .unwrap_or(default))
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), PasstoreError> {
        self.set_setting(SETTING_THEME, &theme.to_string()).await
    }

    // --- Encryption lifecycle ---

    /// Encrypt a plaintext store in place. See [`encryption::migrate`].
    pub async fn migrate(&self, ctx: &EncryptionContext) -> Result<MigrationReport, PasstoreError> {
        encryption::migrate(&self.db, ctx).await
    }

    /// Restore a lost encrypted-store flag. See [`encryption::infer_encryption_flag`].
    pub async fn infer_encryption_flag(&self) -> Result<bool, PasstoreError> {
        encryption::infer_encryption_flag(&self.db).await
    }

    /// Rotate every field to a new key. See [`encryption::rekey`].
    pub async fn rekey(
        &self,
        old: &EncryptionContext,
        new: &EncryptionContext,
        new_master_hash: &str,
    ) -> Result<usize, PasstoreError> {
        encryption::rekey(&self.db, old, new, new_master_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passtore_core::CredentialField;

    async fn store(policy: DecryptFailurePolicy) -> (CredentialStore, Tab) {
        let store = CredentialStore::new(Database::open_in_memory().await.unwrap(), policy);
        let tab = store
            .ensure_default_tab("Principal", "#e0e0e0")
            .await
            .unwrap()
            .unwrap();
        (store, tab)
    }

    fn ctx() -> EncryptionContext {
        EncryptionContext::from_key([5; 32])
    }

    #[tokio::test]
    async fn add_and_get_with_context_roundtrips() {
        let (store, tab) = store(DecryptFailurePolicy::Strict).await;
        let fields = CredentialFields::default()
            .with(CredentialField::Username, "root")
            .with(CredentialField::Password, "toor");
        let ctx = ctx();

        let added = store.add(tab.id, &fields, Some(&ctx)).await.unwrap();
        assert_eq!(added.fields, fields);

        let raw = store.get(added.id, None).await.unwrap().unwrap();
        assert_ne!(raw.fields, fields);

        let read = store.get(added.id, Some(&ctx)).await.unwrap().unwrap();
        assert_eq!(read.fields, fields);
        assert!(read.unreadable.is_empty());
    }

    #[tokio::test]
    async fn mark_unreadable_policy_surfaces_fields() {
        let (store, tab) = store(DecryptFailurePolicy::MarkUnreadable).await;
        let fields = CredentialFields::default().with(CredentialField::Host, "legacy-host");
        let added = store.add(tab.id, &fields, None).await.unwrap();

        let read = store.get(added.id, Some(&ctx())).await.unwrap().unwrap();
        assert!(read.fields.host.is_none());
        assert_eq!(read.unreadable, vec![CredentialField::Host]);
    }

    #[tokio::test]
    async fn list_all_groups_in_tab_order() {
        let (store, first) = store(DecryptFailurePolicy::Strict).await;
        let second = store.create_tab("Second", "#123456").await.unwrap();
        store
            .add(second.id, &CredentialFields::default(), None)
            .await
            .unwrap();

        let all = store.list_all(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0.id, first.id);
        assert!(all[0].1.is_empty());
        assert_eq!(all[1].1.len(), 1);
    }

    #[tokio::test]
    async fn theme_falls_back_to_default() {
        let (store, _) = store(DecryptFailurePolicy::Strict).await;
        assert_eq!(store.theme(Theme::Dark).await.unwrap(), Theme::Dark);
        store.set_setting(SETTING_THEME, "Neon").await.unwrap();
        assert_eq!(store.theme(Theme::Light).await.unwrap(), Theme::Light);
        store.set_theme(Theme::SemiDark).await.unwrap();
        assert_eq!(store.theme(Theme::Light).await.unwrap(), Theme::SemiDark);
    }
}
