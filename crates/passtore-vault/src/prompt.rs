// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password acquisition via TTY prompt or PASSTORE_MASTER_PASSWORD.

use passtore_core::PasstoreError;
use secrecy::SecretString;

/// The environment variable name for providing the master password.
pub const MASTER_PASSWORD_ENV_VAR: &str = "PASSTORE_MASTER_PASSWORD";

fn from_env() -> Option<SecretString> {
    match std::env::var(MASTER_PASSWORD_ENV_VAR) {
        Ok(value) if !value.is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

fn read_line(label: &str) -> Result<String, PasstoreError> {
    eprint!("{label}: ");
    rpassword::read_password()
        .map_err(|e| PasstoreError::InvalidArgument(format!("failed to read password: {e}")))
}

fn no_source() -> PasstoreError {
    PasstoreError::InvalidArgument(format!(
        "no master password provided. Set {MASTER_PASSWORD_ENV_VAR} or run interactively."
    ))
}

/// Get the master password from the environment or an interactive prompt.
///
/// Priority:
/// 1. `PASSTORE_MASTER_PASSWORD` environment variable (for scripts)
/// 2. Interactive TTY prompt via `rpassword`
pub fn get_master_password(label: &str) -> Result<SecretString, PasstoreError> {
    if let Some(password) = from_env() {
        return Ok(password);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let password = read_line(label)?;
        if password.is_empty() {
            return Err(PasstoreError::InvalidArgument(
                "empty master password not allowed".to_string(),
            ));
        }
        return Ok(SecretString::from(password));
    }

    Err(no_source())
}

/// Prompt twice for a new master password and require both entries to match.
///
/// The environment variable, when set, is taken as already confirmed.
pub fn get_master_password_with_confirm(label: &str) -> Result<SecretString, PasstoreError> {
    if let Some(password) = from_env() {
        return Ok(password);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let first = read_line(label)?;
        let second = read_line("Confirm")?;
        if first != second {
            return Err(PasstoreError::InvalidArgument(
                "passwords do not match".to_string(),
            ));
        }
        if first.is_empty() {
            return Err(PasstoreError::InvalidArgument(
                "empty master password not allowed".to_string(),
            ));
        }
        return Ok(SecretString::from(first));
    }

    Err(no_source())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    #[test]
    #[serial]
    fn get_password_from_env_var() {
        // SAFETY: test-only env mutation, serialized with #[serial].
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "test-password") };
        let result = get_master_password("Master password");
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "test-password");
    }

    #[test]
    #[serial]
    fn confirm_variant_accepts_env_var() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "test-password") };
        let result = get_master_password_with_confirm("New master password");
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert!(result.is_ok());
    }

    #[test]
    #[serial]
    fn empty_env_var_is_ignored() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "") };
        let from_env = from_env();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert!(from_env.is_none());
    }
}
