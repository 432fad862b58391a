// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory encryption context built from the master password.

use std::fmt;

use passtore_core::PasstoreError;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto;
use crate::kdf::{self, KEY_LEN};

/// The derived key plus the cipher operations that use it.
///
/// Lives only in memory. The key is zeroed on drop and never printed.
#[derive(Clone)]
pub struct EncryptionContext {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl EncryptionContext {
    /// Derive a context from the master password and the store salt.
    pub fn from_password(password: &SecretString, salt: &[u8]) -> Result<Self, PasstoreError> {
        let key = kdf::derive_key(password.expose_secret().as_bytes(), salt)?;
        Ok(Self { key })
    }

    /// Build a context from an already-derived key.
    pub fn from_key(key: [u8; KEY_LEN]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Encrypt one field value. The empty string stays empty.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, PasstoreError> {
        crypto::encrypt_value(&self.key, plaintext)
    }

    /// Decrypt one field value. The empty string stays empty.
    pub fn decrypt(&self, token: &str) -> Result<String, PasstoreError> {
        crypto::decrypt_value(&self.key, token)
    }
}

impl fmt::Debug for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionContext")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
