// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::TsundokuConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &TsundokuConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.assets.directory.trim().is_empty() {
        fail("assets.directory must not be empty".to_string());
    }

    if config.network.max_concurrent == 0 {
        fail("network.max_concurrent must be at least 1".to_string());
    }

    if config.network.timeout_secs == 0 {
        fail("network.timeout_secs must be at least 1".to_string());
    }

    if config.network.user_agent.trim().is_empty() {
        fail("network.user_agent must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        fail(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
