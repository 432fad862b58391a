// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password verifier stored in the `master_hash` setting.
//!
//! Format: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`, salted
//! independently of the encryption salt. Stores created before salted
//! verifiers hold a bare 64-character hex SHA-256 digest, which still
//! verifies and is flagged for upgrade by [`is_legacy_hash`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use passtore_core::PasstoreError;
use ring::{digest, pbkdf2};
use secrecy::{ExposeSecret, SecretString};

use crate::kdf::{self, KEY_LEN, PBKDF2_ALG, PBKDF2_ITERATIONS};

const SCHEME: &str = "pbkdf2-sha256";

/// Hash the master password for storage.
pub fn hash_master_password(password: &SecretString) -> Result<String, PasstoreError> {
    let salt = kdf::generate_salt()?;
    let mut hash = [0u8; KEY_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        kdf::iterations(PBKDF2_ITERATIONS)?,
        &salt,
        password.expose_secret().as_bytes(),
        &mut hash,
    );
    Ok(format!(
        "{SCHEME}${PBKDF2_ITERATIONS}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(hash)
    ))
}

/// Returns true when `stored` is the unsalted SHA-256 hex form.
pub fn is_legacy_hash(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Check a candidate password against a stored verifier.
///
/// Returns `Ok(false)` on mismatch. A verifier in neither known format is an
/// error, since no password could ever match it.
pub fn verify_master_password(
    password: &SecretString,
    stored: &str,
) -> Result<bool, PasstoreError> {
    let candidate = password.expose_secret().as_bytes();

    if is_legacy_hash(stored) {
        let expected = hex::decode(stored)
            .map_err(|e| PasstoreError::Internal(format!("malformed legacy verifier: {e}")))?;
        let actual = digest::digest(&digest::SHA256, candidate);
        return Ok(constant_time_eq(actual.as_ref(), &expected));
    }

    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return Err(PasstoreError::Internal(
            "stored master verifier has an unknown format".to_string(),
        ));
    };
    if *scheme != SCHEME {
        return Err(PasstoreError::Internal(format!(
            "unsupported master verifier scheme `{scheme}`"
        )));
    }
    let iterations: u32 = iterations
        .parse()
        .map_err(|_| PasstoreError::Internal("master verifier iteration count is invalid".into()))?;
    let salt = STANDARD
        .decode(salt)
        .map_err(|_| PasstoreError::Internal("master verifier salt is not base64".into()))?;
    let hash = STANDARD
        .decode(hash)
        .map_err(|_| PasstoreError::Internal("master verifier hash is not base64".into()))?;

    Ok(pbkdf2::verify(
        PBKDF2_ALG,
        kdf::iterations(iterations)?,
        &salt,
        candidate,
        &hash,
    )
    .is_ok())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
