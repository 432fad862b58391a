// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Passtore credential store.

use thiserror::Error;

/// The primary error type used across all Passtore crates.
#[derive(Debug, Error)]
pub enum PasstoreError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The master password could not be turned into a key (bad salt, corrupted
    /// salt setting). Fatal at startup.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// A stored token failed authentication or could not be decoded.
    #[error("decryption integrity failure{}: {reason}", .field.as_deref().map(|f| format!(" in field `{f}`")).unwrap_or_default())]
    DecryptionIntegrity {
        /// The credential field the token belongs to, when known.
        field: Option<String>,
        /// What went wrong.
        reason: String,
    },

    /// Cipher setup or random generation failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The supplied master password does not match the stored verifier.
    #[error("invalid master password")]
    InvalidMasterPassword,

    /// First-run setup was requested but a master password already exists.
    #[error("a master password is already configured")]
    MasterPasswordAlreadySet,

    /// The store is encrypted and no encryption context has been unlocked.
    #[error("store is locked -- unlock with the master password first")]
    Locked,

    /// Update/delete/lookup of an id that does not exist.
    #[error("{entity} {id} not found")]
    RecordNotFound { entity: &'static str, id: i64 },

    /// Deleting the only remaining group is rejected before any mutation.
    #[error("cannot delete the last remaining group")]
    GroupDeletionOnLastGroup,

    /// A caller supplied an argument the store cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PasstoreError {
    /// Attach a field name to a [`PasstoreError::DecryptionIntegrity`] error.
    ///
    /// Other variants are returned unchanged.
    pub fn for_field(self, name: &str) -> Self {
        match self {
            PasstoreError::DecryptionIntegrity { reason, .. } => {
                PasstoreError::DecryptionIntegrity {
                    field: Some(name.to_string()),
                    reason,
                }
            }
            other => other,
        }
    }

    /// Returns true for [`PasstoreError::DecryptionIntegrity`].
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, PasstoreError::DecryptionIntegrity { .. })
    }
}
