// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record-level encryption of the eleven credential fields.
//!
//! Each present field is encrypted on its own with its own nonce. Identity,
//! group and order are never part of the input.

use passtore_core::{CredentialField, CredentialFields, DecryptFailurePolicy, PasstoreError};
use tracing::warn;

use crate::context::EncryptionContext;

/// Fields of one record after decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedRecord {
    /// Plaintext values. Unreadable fields are `None` or raw, per policy.
    pub fields: CredentialFields,
    /// Fields whose stored token failed to decrypt.
    pub unreadable: Vec<CredentialField>,
}

/// Encrypt every present field. Absent fields stay absent.
pub fn encrypt_record(
    ctx: &EncryptionContext,
    fields: &CredentialFields,
) -> Result<CredentialFields, PasstoreError> {
    fields.try_map(|_, value| ctx.encrypt(value))
}

/// Decrypt every present field, applying `policy` to fields that fail.
pub fn decrypt_record(
    ctx: &EncryptionContext,
    fields: &CredentialFields,
    policy: DecryptFailurePolicy,
) -> Result<DecryptedRecord, PasstoreError> {
    let mut out = CredentialFields::default();
    let mut unreadable = Vec::new();

    for (field, value) in fields.iter() {
        let Some(value) = value else { continue };
        match ctx.decrypt(value) {
            Ok(plaintext) => out.set(field, Some(plaintext)),
            Err(e) if e.is_integrity_failure() => match policy {
                DecryptFailurePolicy::Strict => return Err(e.for_field(field.as_ref())),
                DecryptFailurePolicy::MarkUnreadable => {
                    warn!(field = %field, "field could not be decrypted, marking unreadable");
                    unreadable.push(field);
                }
                DecryptFailurePolicy::LegacyPlaintext => {
                    warn!(field = %field, "field could not be decrypted, returning stored value as legacy plaintext");
                    out.set(field, Some(value.to_string()));
                    unreadable.push(field);
                }
            },
            Err(e) => return Err(e),
        }
    }

    Ok(DecryptedRecord {
        fields: out,
        unreadable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto;
    use tracing_test::traced_test;

    fn ctx(byte: u8) -> EncryptionContext {
        EncryptionContext::from_key([byte; 32])
    }

    fn sample() -> CredentialFields {
        CredentialFields::default()
            .with(CredentialField::Detail, "Prod DB")
            .with(CredentialField::Host, "10.0.0.5")
            .with(CredentialField::Username, "admin")
            .with(CredentialField::Password, "hunter2")
            .with(CredentialField::Contents, "")
    }

    #[test]
    fn encrypt_then_decrypt_restores_fields() {
        let ctx = ctx(1);
        let encrypted = encrypt_record(&ctx, &sample()).unwrap();
        for (field, value) in encrypted.iter() {
            match value {
                Some("") => assert_eq!(field, CredentialField::Contents),
                Some(v) => assert!(crypto::is_token(v), "{field} not encrypted"),
                None => {}
            }
        }
        assert!(encrypted.port.is_none());

        let decrypted = decrypt_record(&ctx, &encrypted, DecryptFailurePolicy::Strict).unwrap();
        assert_eq!(decrypted.fields, sample());
        assert!(decrypted.unreadable.is_empty());
    }

    #[test]
    fn fields_are_encrypted_independently() {
        let ctx = ctx(1);
        let fields = CredentialFields::default()
            .with(CredentialField::Username, "same")
            .with(CredentialField::Password, "same");
        let encrypted = encrypt_record(&ctx, &fields).unwrap();
        assert_ne!(encrypted.username, encrypted.password);
    }

    #[traced_test]
    #[test]
    fn mark_unreadable_drops_value_and_logs() {
        let good = ctx(1);
        let mut stored = encrypt_record(&good, &sample()).unwrap();
        stored.password = Some(ctx(2).encrypt("other key").unwrap());

        let decrypted =
            decrypt_record(&good, &stored, DecryptFailurePolicy::MarkUnreadable).unwrap();
        assert_eq!(decrypted.unreadable, vec![CredentialField::Password]);
        assert!(decrypted.fields.password.is_none());
        assert_eq!(decrypted.fields.username.as_deref(), Some("admin"));
        assert!(logs_contain("marking unreadable"));
        assert!(!logs_contain("other key"));
    }

    #[traced_test]
    #[test]
    fn legacy_plaintext_returns_raw_value() {
        let ctx = ctx(1);
        let mut stored = encrypt_record(&ctx, &sample()).unwrap();
        stored.role = Some("dba".to_string());

        let decrypted =
            decrypt_record(&ctx, &stored, DecryptFailurePolicy::LegacyPlaintext).unwrap();
        assert_eq!(decrypted.fields.role.as_deref(), Some("dba"));
        assert_eq!(decrypted.unreadable, vec![CredentialField::Role]);
        assert!(logs_contain("legacy plaintext"));
    }

    #[test]
    fn strict_fails_with_field_name() {
        let ctx = ctx(1);
        let mut stored = encrypt_record(&ctx, &sample()).unwrap();
        stored.host = Some("pst1:garbage".to_string());

        let err = decrypt_record(&ctx, &stored, DecryptFailurePolicy::Strict).unwrap_err();
        match err {
            PasstoreError::DecryptionIntegrity { field, .. } => {
                assert_eq!(field.as_deref(), Some("host"));
            }
            other => panic!("expected integrity error, got {other:?}"),
        }
    }
}
