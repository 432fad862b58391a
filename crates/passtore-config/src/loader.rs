// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./passtore.toml` > `~/.config/passtore/passtore.toml`
//! > `/etc/passtore/passtore.toml` with environment variable overrides via `PASSTORE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use crate::model::PasstoreConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/passtore/passtore.toml";

/// Config file looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "passtore.toml";

/// Sections an env var can target, as `PASSTORE_<SECTION>_<KEY>`.
const ENV_SECTIONS: [&str; 4] = ["store", "vault", "ui", "log"];

/// Per-user config file under the XDG config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("passtore").join("passtore.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/passtore/passtore.toml` (system-wide)
/// 3. `~/.config/passtore/passtore.toml` (user XDG config)
/// 4. `./passtore.toml` (local directory)
/// 5. `PASSTORE_*` environment variables
pub fn load_config() -> Result<PasstoreConfig, figment::Error> {
    let config: PasstoreConfig = build_figment().extract()?;
    debug!(database_path = %config.store.database_path, "configuration loaded");
    Ok(config)
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PasstoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PasstoreConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PasstoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PasstoreConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PasstoreConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section-to-dot mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `PASSTORE_STORE_BUSY_TIMEOUT_MS` maps to `store.busy_timeout_ms`.
/// `PASSTORE_MASTER_PASSWORD` names no section and is ignored here.
fn env_provider() -> Env {
    Env::prefixed("PASSTORE_")
        .filter(|key| {
            ENV_SECTIONS
                .iter()
                .any(|section| key.as_str().starts_with(&format!("{section}_")))
        })
        .map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        let prefix = format!("{section}_");
        if let Some(rest) = key.strip_prefix(&prefix) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
