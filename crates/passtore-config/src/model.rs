// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Passtore credential store.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use passtore_core::{DecryptFailurePolicy, Theme};
use serde::{Deserialize, Serialize};

/// Top-level Passtore configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PasstoreConfig {
    /// Database location and SQLite behaviour.
    #[serde(default)]
    pub store: StoreConfig,

    /// Encryption and migration behaviour.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Presentation defaults shared with UI collaborators.
    #[serde(default)]
    pub ui: UiConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl PasstoreConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long a connection waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Name of the group created when the store has none.
    #[serde(default = "default_tab_name")]
    pub default_tab_name: String,

    /// Colour of the group created when the store has none.
    #[serde(default = "default_tab_color")]
    pub default_tab_color: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
            default_tab_name: default_tab_name(),
            default_tab_color: default_tab_color(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("passtore").join("passtore.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("passtore.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_tab_name() -> String {
    "Principal".to_string()
}

fn default_tab_color() -> String {
    "#e0e0e0".to_string()
}

/// Vault settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// What a read does with a field that fails to decrypt.
    #[serde(default)]
    pub decrypt_failure_policy: DecryptFailurePolicy,

    /// Encrypt a plaintext store automatically on the first successful unlock.
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            decrypt_failure_policy: DecryptFailurePolicy::default(),
            auto_migrate: default_auto_migrate(),
        }
    }
}

fn default_auto_migrate() -> bool {
    true
}

/// UI defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UiConfig {
    /// Theme used when none has been persisted yet, or the stored one is unknown.
    #[serde(default)]
    pub default_theme: Theme,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Log level for Passtore crates (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
