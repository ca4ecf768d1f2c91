// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tsundoku source registry.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Tsundoku configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TsundokuConfig {
    /// SQLite database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// On-disk asset (icon) layout.
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Outbound HTTP settings shared by every host.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Registry housekeeping.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("tsundoku"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_database_path() -> String {
    data_dir()
        .join("tsundoku.db")
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Where installed host assets live.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsConfig {
    /// Root directory holding `staging/` and `hosts/`.
    #[serde(default = "default_assets_directory")]
    pub directory: String,

    /// Age after which a staging directory without a host row is considered abandoned.
    #[serde(default = "default_staging_grace_secs")]
    pub staging_grace_secs: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            directory: default_assets_directory(),
            staging_grace_secs: default_staging_grace_secs(),
        }
    }
}

impl AssetsConfig {
    pub fn staging_grace(&self) -> Duration {
        Duration::from_secs(self.staging_grace_secs)
    }
}

fn default_assets_directory() -> String {
    data_dir().join("assets").to_string_lossy().into_owned()
}

fn default_staging_grace_secs() -> u64 {
    3600
}

/// Outbound network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of outbound calls in flight across the whole process.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Delay applied before every outbound call, in milliseconds.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// User-Agent header sent to hosts.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            stagger_ms: default_stagger_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    3
}

fn default_stagger_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    concat!("tsundoku/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Registry housekeeping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Finalize half-installed hosts and sweep abandoned staging directories at startup.
    #[serde(default = "default_reconcile_on_startup")]
    pub reconcile_on_startup: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reconcile_on_startup: default_reconcile_on_startup(),
        }
    }
}

fn default_reconcile_on_startup() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
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
