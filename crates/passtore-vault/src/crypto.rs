// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open operations and the field token format.
//!
//! Every call to [`seal`] generates a fresh random 96-bit nonce via the system
//! CSPRNG. A token is `pst1:` followed by base64(nonce || ciphertext || tag).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use passtore_core::PasstoreError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};

use crate::kdf::KEY_LEN;

/// Prefix marking a stored value as an encrypted token.
pub const TOKEN_PREFIX: &str = "pst1:";

const TAG_LEN: usize = 16;

fn integrity(reason: &str) -> PasstoreError {
    PasstoreError::DecryptionIntegrity {
        field: None,
        reason: reason.to_string(),
    }
}

fn aead_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, PasstoreError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| PasstoreError::Crypto("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt plaintext with AES-256-GCM using a random 96-bit nonce.
///
/// Returns `(ciphertext_with_tag, nonce_bytes)`.
pub fn seal(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; NONCE_LEN]), PasstoreError> {
    let less_safe = aead_key(key)?;

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| PasstoreError::Crypto("failed to generate random nonce".to_string()))?;

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| PasstoreError::Crypto("AES-256-GCM encryption failed".to_string()))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt ciphertext with AES-256-GCM.
///
/// `ciphertext` must include the 16-byte authentication tag appended by [`seal`].
pub fn open(
    key: &[u8; KEY_LEN],
    nonce_bytes: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, PasstoreError> {
    let less_safe = aead_key(key)?;
    let nonce = Nonce::assume_unique_for_key(*nonce_bytes);

    let mut in_out = ciphertext.to_vec();
    let plaintext = less_safe
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| integrity("authentication failed -- wrong key or corrupted data"))?;

    Ok(plaintext.to_vec())
}

/// Returns true when `value` carries the token prefix.
pub fn is_token(value: &str) -> bool {
    value.starts_with(TOKEN_PREFIX)
}

/// Encrypt a field value into a self-contained token.
///
/// The empty string maps to itself.
pub fn encrypt_value(key: &[u8; KEY_LEN], plaintext: &str) -> Result<String, PasstoreError> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }
    let (ciphertext, nonce) = seal(key, plaintext.as_bytes())?;
    let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);
    Ok(format!("{TOKEN_PREFIX}{}", STANDARD.encode(payload)))
}

/// Decrypt a token produced by [`encrypt_value`].
///
/// The empty string maps to itself. Anything that is not an authentic token
/// for `key` fails with [`PasstoreError::DecryptionIntegrity`].
pub fn decrypt_value(key: &[u8; KEY_LEN], token: &str) -> Result<String, PasstoreError> {
    if token.is_empty() {
        return Ok(String::new());
    }
    let encoded = token
        .strip_prefix(TOKEN_PREFIX)
        .ok_or_else(|| integrity("value is not an encrypted token"))?;
    let payload = STANDARD
        .decode(encoded)
        .map_err(|_| integrity("token is not valid base64"))?;
    if payload.len() < NONCE_LEN + TAG_LEN {
        return Err(integrity("token is too short"));
    }
    let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| integrity("token nonce is malformed"))?;
    let plaintext = open(key, &nonce, ciphertext)?;
    String::from_utf8(plaintext).map_err(|_| integrity("plaintext is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn random_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        SystemRandom::new().fill(&mut key).unwrap();
        key
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = random_key();
        let (ciphertext, nonce) = seal(&key, b"secret value").unwrap();
        assert_eq!(open(&key, &nonce, &ciphertext).unwrap(), b"secret value");
    }

    #[test]
    fn ciphertext_is_longer_than_plaintext() {
        let key = random_key();
        let (ciphertext, _) = seal(&key, b"hello").unwrap();
        assert_eq!(ciphertext.len(), 5 + TAG_LEN);
    }

    #[test]
    fn token_roundtrip_unicode() {
        let key = random_key();
        let plaintext = "contraseña ✓ 密码";
        let token = encrypt_value(&key, plaintext).unwrap();
        assert!(is_token(&token));
        assert_eq!(decrypt_value(&key, &token).unwrap(), plaintext);
    }

    #[test]
    fn empty_maps_to_empty() {
        let key = random_key();
        assert_eq!(encrypt_value(&key, "").unwrap(), "");
        assert_eq!(decrypt_value(&key, "").unwrap(), "");
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let key = random_key();
        let t1 = encrypt_value(&key, "same input").unwrap();
        let t2 = encrypt_value(&key, "same input").unwrap();
        assert_ne!(t1, t2);
    }

    #[test]
    fn wrong_key_is_integrity_failure() {
        let token = encrypt_value(&random_key(), "secret").unwrap();
        let err = decrypt_value(&random_key(), &token).unwrap_err();
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn plaintext_is_integrity_failure() {
        let err = decrypt_value(&random_key(), "hunter2").unwrap_err();
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn bad_base64_and_short_tokens_fail() {
        let key = random_key();
        assert!(decrypt_value(&key, "pst1:!!!").unwrap_err().is_integrity_failure());
        let short = format!("{TOKEN_PREFIX}{}", STANDARD.encode([0u8; 8]));
        assert!(decrypt_value(&key, &short).unwrap_err().is_integrity_failure());
    }

    #[test]
    fn tampered_token_fails() {
        let key = random_key();
        let token = encrypt_value(&key, "do not tamper").unwrap();
        let mut payload = STANDARD.decode(&token[TOKEN_PREFIX.len()..]).unwrap();
        let last = payload.len() - 1;
        payload[last] ^= 0x01;
        let tampered = format!("{TOKEN_PREFIX}{}", STANDARD.encode(payload));
        assert!(decrypt_value(&key, &tampered).unwrap_err().is_integrity_failure());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn any_string_roundtrips(s in ".*") {
            let key = random_key();
            let token = encrypt_value(&key, &s).unwrap();
            prop_assert_eq!(decrypt_value(&key, &token).unwrap(), s);
        }

        #[test]
        fn any_bit_flip_is_detected(s in ".{1,64}", bit in 0usize..8, pos in any::<prop::sample::Index>()) {
            let key = random_key();
            let token = encrypt_value(&key, &s).unwrap();
            let mut payload = STANDARD.decode(&token[TOKEN_PREFIX.len()..]).unwrap();
            let i = pos.index(payload.len());
            payload[i] ^= 1 << bit;
            let tampered = format!("{TOKEN_PREFIX}{}", STANDARD.encode(payload));
            prop_assert!(decrypt_value(&key, &tampered).is_err());
        }
    }
}
