// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 key derivation from the master password.
//!
//! The iteration count, salt length and key length are part of the stored
//! format: changing any of them makes existing stores unreadable.

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use passtore_core::PasstoreError;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Length of the encryption salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of the derived AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

pub(crate) static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

pub(crate) fn iterations(count: u32) -> Result<NonZeroU32, PasstoreError> {
    NonZeroU32::new(count)
        .ok_or_else(|| PasstoreError::KeyDerivation("iteration count must be non-zero".into()))
}

/// Derive a 32-byte key from the master password and the store salt.
///
/// Deterministic for a given `(password, salt)`. A salt of the wrong length
/// fails with [`PasstoreError::KeyDerivation`].
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, PasstoreError> {
    if salt.len() != SALT_LEN {
        return Err(PasstoreError::KeyDerivation(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        PBKDF2_ALG,
        iterations(PBKDF2_ITERATIONS)?,
        salt,
        password,
        &mut key[..],
    );
    Ok(key)
}

/// Generate a random 16-byte salt from the system CSPRNG.
pub fn generate_salt() -> Result<[u8; SALT_LEN], PasstoreError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| PasstoreError::Crypto("failed to generate random salt".to_string()))?;
    Ok(salt)
}

/// Encode a salt for the `encryption_salt` setting.
pub fn encode_salt(salt: &[u8]) -> String {
    STANDARD.encode(salt)
}

/// Decode the `encryption_salt` setting.
pub fn decode_salt(encoded: &str) -> Result<[u8; SALT_LEN], PasstoreError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| PasstoreError::KeyDerivation(format!("stored salt is not base64: {e}")))?;
    <[u8; SALT_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        PasstoreError::KeyDerivation(format!(
            "stored salt must be {SALT_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}
