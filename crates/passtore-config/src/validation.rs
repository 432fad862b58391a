// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, known log levels, and colour formats.

use crate::diagnostic::ConfigError;
use crate::model::PasstoreConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first one.
pub fn validate_config(config: &PasstoreConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.store.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "store.database_path must not be empty".to_string(),
        });
    }

    if config.store.busy_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "store.busy_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.store.default_tab_name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "store.default_tab_name must not be empty".to_string(),
        });
    }

    if !is_hex_color(&config.store.default_tab_color) {
        errors.push(ConfigError::Validation {
            message: format!(
                "store.default_tab_color `{}` is not a #rrggbb colour",
                config.store.default_tab_color
            ),
        });
    }

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Returns true for `#rrggbb` hex colours.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
