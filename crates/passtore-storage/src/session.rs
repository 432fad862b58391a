// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plaintext API for UI and export collaborators.
//!
//! A [`Session`] owns the store and the unlocked encryption context. Callers
//! only ever see plaintext: fields are encrypted on write and decrypted on
//! read whenever the store is flagged as encrypted.
//!
//! The context sits behind a `tokio::sync::RwLock`. Field reads and writes
//! hold the read guard from the flag check until the row is persisted;
//! unlock, migration and password change take the write guard, so in-flight
//! operations finish with the old key before it is replaced.

use passtore_config::PasstoreConfig;
use passtore_core::types::{
    SETTING_DATA_ENCRYPTED, SETTING_ENCRYPTION_SALT, SETTING_MASTER_HASH,
};
use passtore_core::{Credential, CredentialFields, MoveDirection, PasstoreError, Tab, Theme};
use passtore_vault::kdf::{self, SALT_LEN};
use passtore_vault::{EncryptionContext, hash_master_password, is_legacy_hash, verify_master_password};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::database::{Database, DatabaseOptions};
use crate::encryption::MigrationReport;
use crate::store::CredentialStore;

const RESERVED_SETTINGS: [&str; 3] = [
    SETTING_MASTER_HASH,
    SETTING_ENCRYPTION_SALT,
    SETTING_DATA_ENCRYPTED,
];

/// Session behaviour taken from configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Encrypt a plaintext store on the first successful unlock.
    pub auto_migrate: bool,
    /// Theme reported when none is stored.
    pub default_theme: Theme,
    /// Name of the group created in an empty store.
    pub default_tab_name: String,
    /// Colour of the group created in an empty store.
    pub default_tab_color: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_migrate: true,
            default_theme: Theme::default(),
            default_tab_name: "Principal".to_string(),
            default_tab_color: "#e0e0e0".to_string(),
        }
    }
}

impl From<&PasstoreConfig> for SessionOptions {
    fn from(config: &PasstoreConfig) -> Self {
        Self {
            auto_migrate: config.vault.auto_migrate,
            default_theme: config.ui.default_theme,
            default_tab_name: config.store.default_tab_name.clone(),
            default_tab_color: config.store.default_tab_color.clone(),
        }
    }
}

/// An open store plus its (possibly unlocked) encryption context.
pub struct Session {
    store: CredentialStore,
    ctx: RwLock<Option<EncryptionContext>>,
    options: SessionOptions,
}

impl Session {
    /// Open the configured database and prepare it for use.
    pub async fn open(config: &PasstoreConfig) -> Result<Self, PasstoreError> {
        let db = Database::open_with(
            &config.store.database_path,
            &DatabaseOptions::from(&config.store),
        )
        .await?;
        let store = CredentialStore::new(db, config.vault.decrypt_failure_policy);
        Self::with_store(store, SessionOptions::from(config)).await
    }

    /// Wrap an existing store: ensure the default group exists and restore a
    /// lost encrypted-store flag.
    pub async fn with_store(
        store: CredentialStore,
        options: SessionOptions,
    ) -> Result<Self, PasstoreError> {
        store
            .ensure_default_tab(&options.default_tab_name, &options.default_tab_color)
            .await?;
        store.infer_encryption_flag().await?;
        Ok(Self {
            store,
            ctx: RwLock::new(None),
            options,
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Drop the key and close the database.
    pub async fn close(self) -> Result<(), PasstoreError> {
        drop(self.ctx);
        self.store.close().await
    }

    // --- Master password ---

    pub async fn has_master_password(&self) -> Result<bool, PasstoreError> {
        Ok(self.store.get_setting(SETTING_MASTER_HASH).await?.is_some())
    }

    pub async fn is_unlocked(&self) -> bool {
        self.ctx.read().await.is_some()
    }

    /// The store salt. A plaintext store gets one on first use; an encrypted
    /// store without one cannot be unlocked.
    async fn encryption_salt(&self) -> Result<[u8; SALT_LEN], PasstoreError> {
        if self.store.is_encrypted().await? {
            let stored = self
                .store
                .get_setting(SETTING_ENCRYPTION_SALT)
                .await?
                .ok_or_else(|| {
                    PasstoreError::KeyDerivation(
                        "store is encrypted but its encryption salt is missing".to_string(),
                    )
                })?;
            return kdf::decode_salt(&stored);
        }
        let candidate = kdf::encode_salt(&kdf::generate_salt()?);
        let stored = self
            .store
            .insert_setting_if_absent(SETTING_ENCRYPTION_SALT, &candidate)
            .await?;
        kdf::decode_salt(&stored)
    }

    async fn maybe_migrate(
        &self,
        ctx: &EncryptionContext,
    ) -> Result<Option<MigrationReport>, PasstoreError> {
        if !self.options.auto_migrate || self.store.is_encrypted().await? {
            return Ok(None);
        }
        self.store.migrate(ctx).await.map(Some)
    }

    /// First-run setup: store the verifier, create the salt, unlock.
    ///
    /// Fails with [`PasstoreError::MasterPasswordAlreadySet`] when a verifier
    /// already exists. Returns the migration report when auto-migration ran.
    pub async fn setup_master_password(
        &self,
        password: &SecretString,
    ) -> Result<Option<MigrationReport>, PasstoreError> {
        let mut guard = self.ctx.write().await;
        let hash = hash_master_password(password)?;
        let stored = self
            .store
            .insert_setting_if_absent(SETTING_MASTER_HASH, &hash)
            .await?;
        if stored != hash {
            return Err(PasstoreError::MasterPasswordAlreadySet);
        }

        let salt = self.encryption_salt().await?;
        let ctx = EncryptionContext::from_password(password, &salt)?;
        let report = self.maybe_migrate(&ctx).await?;
        *guard = Some(ctx);
        info!("master password configured");
        Ok(report)
    }

    /// Verify the master password and unlock the store.
    ///
    /// A legacy SHA-256 verifier is replaced by a salted one. With
    /// auto-migration enabled, a plaintext store is encrypted here.
    pub async fn unlock(
        &self,
        password: &SecretString,
    ) -> Result<Option<MigrationReport>, PasstoreError> {
        let mut guard = self.ctx.write().await;
        let stored = self.stored_verifier().await?;
        if !verify_master_password(password, &stored)? {
            warn!("master password rejected");
            return Err(PasstoreError::InvalidMasterPassword);
        }
        if is_legacy_hash(&stored) {
            self.store
                .set_setting(SETTING_MASTER_HASH, &hash_master_password(password)?)
                .await?;
            info!("legacy master password verifier upgraded");
        }

        let salt = self.encryption_salt().await?;
        let ctx = EncryptionContext::from_password(password, &salt)?;
        let report = self.maybe_migrate(&ctx).await?;
        *guard = Some(ctx);
        info!("store unlocked");
        Ok(report)
    }

    /// Forget the key. Field access on an encrypted store fails until the
    /// next unlock.
    pub async fn lock(&self) {
        *self.ctx.write().await = None;
    }

    /// Check a candidate password without unlocking.
    pub async fn verify_master_password(
        &self,
        password: &SecretString,
    ) -> Result<bool, PasstoreError> {
        match self.store.get_setting(SETTING_MASTER_HASH).await? {
            Some(stored) => verify_master_password(password, &stored),
            None => Ok(false),
        }
    }

    /// Replace the master password and re-encrypt every field under the new key.
    ///
    /// The salt is kept. Re-encryption and the new verifier commit together;
    /// on any failure the old password keeps working. Returns the number of
    /// records re-encrypted. A new password equal to the current one is
    /// rejected with [`PasstoreError::InvalidArgument`].
    pub async fn change_master_password(
        &self,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<usize, PasstoreError> {
        if current.expose_secret() == new.expose_secret() {
            return Err(PasstoreError::InvalidArgument(
                "new master password must differ from the current one".to_string(),
            ));
        }
        let mut guard = self.ctx.write().await;
        let stored = self.stored_verifier().await?;
        if !verify_master_password(current, &stored)? {
            warn!("master password change rejected");
            return Err(PasstoreError::InvalidMasterPassword);
        }

        let salt = self.encryption_salt().await?;
        let old_ctx = EncryptionContext::from_password(current, &salt)?;
        let new_ctx = EncryptionContext::from_password(new, &salt)?;
        let new_hash = hash_master_password(new)?;
        let records = self.store.rekey(&old_ctx, &new_ctx, &new_hash).await?;
        *guard = Some(new_ctx);
        info!(records, "master password changed");
        Ok(records)
    }

    async fn stored_verifier(&self) -> Result<String, PasstoreError> {
        self.store
            .get_setting(SETTING_MASTER_HASH)
            .await?
            .ok_or_else(|| {
                PasstoreError::InvalidArgument("no master password has been set up".to_string())
            })
    }

    /// The context to use for field access, or `Locked` when the store is
    /// encrypted and no key is held.
    async fn field_context<'a>(
        &self,
        guard: &'a Option<EncryptionContext>,
    ) -> Result<Option<&'a EncryptionContext>, PasstoreError> {
        if self.store.is_encrypted().await? {
            guard.as_ref().map(Some).ok_or(PasstoreError::Locked)
        } else {
            Ok(None)
        }
    }

    // --- Credentials ---

    pub async fn add_credential(
        &self,
        tab_id: i64,
        fields: &CredentialFields,
    ) -> Result<Credential, PasstoreError> {
        let guard = self.ctx.read().await;
        let ctx = self.field_context(&guard).await?;
        self.store.add(tab_id, fields, ctx).await
    }

    pub async fn update_credential(
        &self,
        id: i64,
        fields: &CredentialFields,
    ) -> Result<(), PasstoreError> {
        let guard = self.ctx.read().await;
        let ctx = self.field_context(&guard).await?;
        self.store.update(id, fields, ctx).await
    }

    pub async fn get_credential(&self, id: i64) -> Result<Option<Credential>, PasstoreError> {
        let guard = self.ctx.read().await;
        let ctx = self.field_context(&guard).await?;
        self.store.get(id, ctx).await
    }

    /// Credentials of one group in display order.
    pub async fn credentials_in_tab(&self, tab_id: i64) -> Result<Vec<Credential>, PasstoreError> {
        let guard = self.ctx.read().await;
        let ctx = self.field_context(&guard).await?;
        self.store.get_by_group(tab_id, ctx).await
    }

    /// Every group with its credentials, for export collaborators.
    pub async fn export_all(&self) -> Result<Vec<(Tab, Vec<Credential>)>, PasstoreError> {
        let guard = self.ctx.read().await;
        let ctx = self.field_context(&guard).await?;
        self.store.list_all(ctx).await
    }

    pub async fn delete_credential(&self, id: i64) -> Result<(), PasstoreError> {
        self.store.delete(id).await
    }

    pub async fn set_row_color(&self, id: i64, color: Option<&str>) -> Result<(), PasstoreError> {
        self.store.set_row_color(id, color).await
    }

    /// Swap a credential with its neighbour. `false` at either end.
    pub async fn move_credential(
        &self,
        id: i64,
        tab_id: i64,
        direction: MoveDirection,
    ) -> Result<bool, PasstoreError> {
        match direction {
            MoveDirection::Up => self.store.move_up(id, tab_id).await,
            MoveDirection::Down => self.store.move_down(id, tab_id).await,
        }
    }

    pub async fn compact_tab(&self, tab_id: i64) -> Result<usize, PasstoreError> {
        self.store.compact(tab_id).await
    }

    // --- Groups ---

    pub async fn list_tabs(&self) -> Result<Vec<Tab>, PasstoreError> {
        self.store.list_tabs().await
    }

    pub async fn create_tab(&self, name: &str, color: &str) -> Result<Tab, PasstoreError> {
        self.store.create_tab(name, color).await
    }

    pub async fn rename_tab(&self, id: i64, name: &str) -> Result<(), PasstoreError> {
        self.store.rename_tab(id, name).await
    }

    pub async fn recolor_tab(&self, id: i64, color: &str) -> Result<(), PasstoreError> {
        self.store.recolor_tab(id, color).await
    }

    pub async fn reorder_tabs(&self, ids: &[i64]) -> Result<(), PasstoreError> {
        self.store.reorder_tabs(ids).await
    }

    pub async fn move_tab(&self, id: i64, direction: MoveDirection) -> Result<bool, PasstoreError> {
        self.store.move_tab(id, direction).await
    }

    pub async fn delete_tab(&self, id: i64) -> Result<usize, PasstoreError> {
        self.store.delete_tab(id).await
    }

    // --- Encryption state ---

    /// Encrypt a plaintext store with the unlocked key.
    pub async fn run_migration(&self) -> Result<MigrationReport, PasstoreError> {
        let guard = self.ctx.write().await;
        let ctx = guard.as_ref().ok_or(PasstoreError::Locked)?;
        self.store.migrate(ctx).await
    }

    pub async fn is_store_encrypted(&self) -> Result<bool, PasstoreError> {
        self.store.is_encrypted().await
    }

    // --- Theme and settings ---

    pub async fn theme(&self) -> Result<Theme, PasstoreError> {
        self.store.theme(self.options.default_theme).await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), PasstoreError> {
        self.store.set_theme(theme).await
    }

    /// Advance to the next theme and persist it.
    pub async fn cycle_theme(&self) -> Result<Theme, PasstoreError> {
        let next = self.theme().await?.next();
        self.set_theme(next).await?;
        Ok(next)
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, PasstoreError> {
        self.store.get_setting(key).await
    }

    /// Set a collaborator setting. Keys owned by the encryption layer are refused.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<(), PasstoreError> {
        if RESERVED_SETTINGS.contains(&key) {
            return Err(PasstoreError::InvalidArgument(format!(
                "setting `{key}` is managed by the store"
            )));
        }
        self.store.set_setting(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passtore_core::{CredentialField, DecryptFailurePolicy};

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    async fn session(options: SessionOptions) -> Session {
        let store = CredentialStore::new(
            Database::open_in_memory().await.unwrap(),
            DecryptFailurePolicy::Strict,
        );
        Session::with_store(store, options).await.unwrap()
    }

    async fn first_tab(session: &Session) -> Tab {
        session.list_tabs().await.unwrap().remove(0)
    }

    #[tokio::test]
    async fn opens_with_default_tab() {
        let session = session(SessionOptions::default()).await;
        let tabs = session.list_tabs().await.unwrap();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].name, "Principal");
        assert_eq!(tabs[0].color, "#e0e0e0");
        assert!(!session.has_master_password().await.unwrap());
    }

    #[tokio::test]
    async fn setup_twice_is_rejected() {
        let session = session(SessionOptions::default()).await;
        session.setup_master_password(&secret("one")).await.unwrap();
        assert!(matches!(
            session.setup_master_password(&secret("two")).await,
            Err(PasstoreError::MasterPasswordAlreadySet)
        ));
        assert!(session.verify_master_password(&secret("one")).await.unwrap());
    }

    #[tokio::test]
    async fn locked_encrypted_store_refuses_field_access() {
        let session = session(SessionOptions::default()).await;
        session.setup_master_password(&secret("pw")).await.unwrap();
        assert!(session.is_store_encrypted().await.unwrap());
        let tab = first_tab(&session).await;

        session.lock().await;
        assert!(matches!(
            session.add_credential(tab.id, &CredentialFields::default()).await,
            Err(PasstoreError::Locked)
        ));
        assert!(matches!(
            session.credentials_in_tab(tab.id).await,
            Err(PasstoreError::Locked)
        ));
        assert!(matches!(
            session.run_migration().await,
            Err(PasstoreError::Locked)
        ));
    }

    #[tokio::test]
    async fn wrong_password_does_not_unlock() {
        let session = session(SessionOptions::default()).await;
        session.setup_master_password(&secret("right")).await.unwrap();
        session.lock().await;
        assert!(matches!(
            session.unlock(&secret("wrong")).await,
            Err(PasstoreError::InvalidMasterPassword)
        ));
        assert!(!session.is_unlocked().await);
    }

    #[tokio::test]
    async fn missing_salt_on_encrypted_store_is_fatal() {
        let session = session(SessionOptions::default()).await;
        session.setup_master_password(&secret("pw")).await.unwrap();
        let tab = first_tab(&session).await;
        let fields = CredentialFields::default().with(CredentialField::Password, "hunter2");
        session.add_credential(tab.id, &fields).await.unwrap();

        session
            .store()
            .database()
            .connection()
            .call(|conn| conn.execute("DELETE FROM settings WHERE key = 'encryption_salt'", []))
            .await
            .unwrap();
        session.lock().await;

        assert!(matches!(
            session.unlock(&secret("pw")).await,
            Err(PasstoreError::KeyDerivation(_))
        ));
        assert!(!session.is_unlocked().await);
        assert!(matches!(
            session.change_master_password(&secret("pw"), &secret("new")).await,
            Err(PasstoreError::KeyDerivation(_))
        ));
        assert!(
            session
                .get_setting(SETTING_ENCRYPTION_SALT)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn change_to_same_password_is_rejected() {
        let session = session(SessionOptions::default()).await;
        session.setup_master_password(&secret("pw")).await.unwrap();
        let verifier = session.get_setting(SETTING_MASTER_HASH).await.unwrap();

        assert!(matches!(
            session.change_master_password(&secret("pw"), &secret("pw")).await,
            Err(PasstoreError::InvalidArgument(_))
        ));
        assert_eq!(session.get_setting(SETTING_MASTER_HASH).await.unwrap(), verifier);
        assert!(session.is_unlocked().await);
    }

    fn legacy_digest(password: &str) -> String {
        hex::encode(ring::digest::digest(&ring::digest::SHA256, password.as_bytes()))
    }

    #[tokio::test]
    async fn legacy_verifier_is_upgraded_on_unlock() {
        let session = session(SessionOptions::default()).await;
        session
            .store()
            .set_setting(SETTING_MASTER_HASH, &legacy_digest("legacy"))
            .await
            .unwrap();

        session.unlock(&secret("legacy")).await.unwrap();
        let stored = session.get_setting(SETTING_MASTER_HASH).await.unwrap().unwrap();
        assert!(!is_legacy_hash(&stored));
        assert!(session.verify_master_password(&secret("legacy")).await.unwrap());
        assert!(!session.verify_master_password(&secret("other")).await.unwrap());
    }

    #[tokio::test]
    async fn plaintext_mode_without_auto_migrate() {
        let session = session(SessionOptions {
            auto_migrate: false,
            ..SessionOptions::default()
        })
        .await;
        session.setup_master_password(&secret("pw")).await.unwrap();
        assert!(!session.is_store_encrypted().await.unwrap());

        let tab = first_tab(&session).await;
        let fields = CredentialFields::default().with(CredentialField::Password, "plain");
        let c = session.add_credential(tab.id, &fields).await.unwrap();
        let raw = session.store().get(c.id, None).await.unwrap().unwrap();
        assert_eq!(raw.fields.password.as_deref(), Some("plain"));

        let report = session.run_migration().await.unwrap();
        assert_eq!(report.records, 1);
        let raw = session.store().get(c.id, None).await.unwrap().unwrap();
        assert_ne!(raw.fields.password.as_deref(), Some("plain"));
        let read = session.get_credential(c.id).await.unwrap().unwrap();
        assert_eq!(read.fields.password.as_deref(), Some("plain"));
    }

    #[tokio::test]
    async fn reserved_settings_are_refused() {
        let session = session(SessionOptions::default()).await;
        for key in RESERVED_SETTINGS {
            assert!(matches!(
                session.set_setting(key, "x").await,
                Err(PasstoreError::InvalidArgument(_))
            ));
        }
        session.set_setting("window_width", "800").await.unwrap();
    }

    #[tokio::test]
    async fn theme_cycles_and_persists() {
        let session = session(SessionOptions::default()).await;
        assert_eq!(session.theme().await.unwrap(), Theme::Light);
        assert_eq!(session.cycle_theme().await.unwrap(), Theme::SemiDark);
        assert_eq!(session.cycle_theme().await.unwrap(), Theme::Dark);
        assert_eq!(session.cycle_theme().await.unwrap(), Theme::Light);
        assert_eq!(session.theme().await.unwrap(), Theme::Light);
    }
}
