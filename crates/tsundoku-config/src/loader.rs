// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tsundoku.toml` > `~/.config/tsundoku/tsundoku.toml` > `/etc/tsundoku/tsundoku.toml`
//! with environment variable overrides via `TSUNDOKU_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TsundokuConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tsundoku/tsundoku.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tsundoku.toml";

/// Path of the per-user configuration file, if a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("tsundoku").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tsundoku/tsundoku.toml` (system-wide)
/// 3. `~/.config/tsundoku/tsundoku.toml` (user XDG config)
/// 4. `./tsundoku.toml` (local directory)
/// 5. `TSUNDOKU_*` environment variables
pub fn load_config() -> Result<TsundokuConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TsundokuConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TsundokuConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TsundokuConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TsundokuConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TsundokuConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping the first underscore to a section separator.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that
/// `TSUNDOKU_NETWORK_MAX_CONCURRENT` maps to `network.max_concurrent`, not
/// `network.max.concurrent`.
fn env_provider() -> Env {
    Env::prefixed("TSUNDOKU_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("storage_", "storage.", 1)
            .replacen("assets_", "assets.", 1)
            .replacen("network_", "network.", 1)
            .replacen("registry_", "registry.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
