// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tsundoku configuration system.

use tsundoku_config::diagnostic::ConfigError;
use tsundoku_config::model::TsundokuConfig;
use tsundoku_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with every known field deserializes.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[storage]
database_path = "/tmp/registry.db"
wal_mode = false

[assets]
directory = "/tmp/assets"
staging_grace_secs = 120

[network]
timeout_secs = 10
max_concurrent = 5
stagger_ms = 250
user_agent = "reader/1.0"

[registry]
reconcile_on_startup = false

[log]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.storage.database_path, "/tmp/registry.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.assets.directory, "/tmp/assets");
    assert_eq!(config.assets.staging_grace_secs, 120);
    assert_eq!(config.network.timeout_secs, 10);
    assert_eq!(config.network.max_concurrent, 5);
    assert_eq!(config.network.stagger().as_millis(), 250);
    assert_eq!(config.network.user_agent, "reader/1.0");
    assert!(!config.registry.reconcile_on_startup);
    assert_eq!(config.log.level, "debug");
}

/// Empty config falls back to the throttler defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    let defaults = TsundokuConfig::default();
    assert_eq!(config.network.max_concurrent, 3);
    assert_eq!(config.network.stagger_ms, 500);
    assert_eq!(config.storage.database_path, defaults.storage.database_path);
    assert!(config.registry.reconcile_on_startup);
}

/// Unknown keys are rejected with a suggestion.
#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[network]
max_concurent = 2
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key must fail");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_concurent");
            assert_eq!(suggestion.as_deref(), Some("max_concurrent"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level sections are rejected.
#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[telemetry]\nenabled = true\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

/// Wrong value types are reported with the offending value.
#[test]
fn wrong_type_reports_value() {
    let errors = load_and_validate_str("[network]\nmax_concurrent = \"many\"\n").unwrap_err();
    match &errors[0] {
        ConfigError::InvalidType { found, .. } => assert!(found.contains("many")),
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

/// Semantic validation runs after deserialization.
#[test]
fn zero_concurrency_fails_validation() {
    let errors = load_and_validate_str("[network]\nmax_concurrent = 0\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| e.to_string().contains("network.max_concurrent"))
    );
}
