// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Passtore configuration system.

use passtore_config::diagnostic::ConfigError;
use passtore_config::model::PasstoreConfig;
use passtore_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use passtore_core::{DecryptFailurePolicy, Theme};
use serial_test::serial;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_passtore_config() {
    let toml = r##"
[store]
database_path = "/tmp/passtore-test.db"
wal_mode = false
busy_timeout_ms = 250
default_tab_name = "Main"
default_tab_color = "#336699"

[vault]
decrypt_failure_policy = "strict"
auto_migrate = false

[ui]
default_theme = "Semi-Dark"

[log]
level = "debug"
"##;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.store.database_path, "/tmp/passtore-test.db");
    assert!(!config.store.wal_mode);
    assert_eq!(config.store.busy_timeout_ms, 250);
    assert_eq!(config.store.default_tab_name, "Main");
    assert_eq!(config.store.default_tab_color, "#336699");
    assert_eq!(config.vault.decrypt_failure_policy, DecryptFailurePolicy::Strict);
    assert!(!config.vault.auto_migrate);
    assert_eq!(config.ui.default_theme, Theme::SemiDark);
    assert_eq!(config.log.level, "debug");
}

/// Sections may be omitted entirely.
#[test]
fn partial_toml_keeps_defaults() {
    let config = load_config_from_str("[log]\nlevel = \"warn\"\n").unwrap();
    assert_eq!(config.log.level, "warn");
    assert_eq!(config.store.default_tab_name, "Principal");
    assert!(config.vault.auto_migrate);
}

/// Unknown key inside a section is rejected with a suggestion.
#[test]
fn unknown_key_in_store_suggests_correction() {
    let toml = r#"
[store]
databse_path = "/tmp/x.db"
"#;

    let errors = load_and_validate_str(toml).expect_err("typo should be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "databse_path");
            assert_eq!(suggestion.as_deref(), Some("database_path"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// An unknown policy name is reported as an invalid value.
#[test]
fn unknown_policy_is_invalid_value() {
    let toml = r#"
[vault]
decrypt_failure_policy = "ignore"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown policy should be rejected");
    assert!(
        matches!(&errors[0], ConfigError::InvalidValue { key, .. } if key.contains("decrypt_failure_policy")),
        "got {errors:?}"
    );
}

/// Wrong type for a scalar is reported.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[store]
busy_timeout_ms = "soon"
"#;
    assert!(load_and_validate_str(toml).is_err());
}

/// Semantic validation runs after successful deserialization.
#[test]
fn validation_runs_after_parse() {
    let toml = r#"
[store]
default_tab_color = "lightgrey"
"#;
    let errors = load_and_validate_str(toml).expect_err("bad colour should fail validation");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

/// Serialized defaults round-trip through the loader unchanged.
#[test]
fn serialized_defaults_are_sensible() {
    let config = PasstoreConfig::default();
    let rendered = config.to_toml().unwrap();
    let reparsed = load_config_from_str(&rendered).unwrap();
    assert_eq!(reparsed.store.database_path, config.store.database_path);
    assert_eq!(reparsed.ui.default_theme, Theme::Light);
}

/// Environment variables override file values.
#[test]
#[serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("passtore.toml");
    std::fs::write(&path, "[store]\nbusy_timeout_ms = 100\n").unwrap();

    unsafe {
        std::env::set_var("PASSTORE_STORE_BUSY_TIMEOUT_MS", "900");
        std::env::set_var("PASSTORE_VAULT_DECRYPT_FAILURE_POLICY", "legacy-plaintext");
    }
    let result = load_and_validate_path(&path);
    unsafe {
        std::env::remove_var("PASSTORE_STORE_BUSY_TIMEOUT_MS");
        std::env::remove_var("PASSTORE_VAULT_DECRYPT_FAILURE_POLICY");
    }

    let config = result.expect("env overrides should load");
    assert_eq!(config.store.busy_timeout_ms, 900);
    assert_eq!(
        config.vault.decrypt_failure_policy,
        DecryptFailurePolicy::LegacyPlaintext
    );
}

/// The master password variable shares the prefix but is not a config key.
#[test]
#[serial]
fn master_password_env_is_not_a_config_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("passtore.toml");
    std::fs::write(&path, "").unwrap();

    unsafe { std::env::set_var("PASSTORE_MASTER_PASSWORD", "secret") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("PASSTORE_MASTER_PASSWORD") };

    assert!(result.is_ok(), "got {:?}", result.err());
}
