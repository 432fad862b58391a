// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field-level encryption for the Passtore credential store.
//!
//! The master password is stretched with PBKDF2-HMAC-SHA256 over a per-store
//! salt into an AES-256-GCM key. Each credential field is sealed on its own
//! into a `pst1:` token with a fresh random nonce.

pub mod codec;
pub mod context;
pub mod crypto;
pub mod kdf;
pub mod master;
pub mod prompt;

pub use codec::{DecryptedRecord, decrypt_record, encrypt_record};
pub use context::EncryptionContext;
pub use crypto::{TOKEN_PREFIX, is_token};
pub use master::{hash_master_password, is_legacy_hash, verify_master_password};
pub use prompt::{get_master_password, get_master_password_with_confirm};
