// crates/release-ledger-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load and Validation Tests
// Description: Validate fail-closed loading and range checks.
// Purpose: Ensure invalid configuration never resolves silently.
// ============================================================================

//! Load and validation tests for the configuration model.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;

use release_ledger_config::ConfigError;
use release_ledger_config::ReleaseLedgerConfig;

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let result = ReleaseLedgerConfig::load(Some(&missing));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn valid_file_loads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("release-ledger.toml");
    fs::write(
        &path,
        r#"
[run]
promotion_window_hours = 12

[store]
retention_days = 45
"#,
    )
    .unwrap();

    let config = ReleaseLedgerConfig::load(Some(&path)).unwrap();
    assert_eq!(config.run.promotion_window_hours, 12);
    assert_eq!(config.store.retention_days, 45);
}

#[test]
fn oversized_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("release-ledger.toml");
    let padding = format!("# {}\n", "x".repeat(2 * 1024 * 1024));
    fs::write(&path, padding).unwrap();

    let result = ReleaseLedgerConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn non_utf8_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("release-ledger.toml");
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

    let result = ReleaseLedgerConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn unknown_keys_fail_closed() {
    let result: Result<ReleaseLedgerConfig, _> = toml::from_str(
        r#"
[run]
promotion_window_hours = 24
surprise = true
"#,
    );
    assert!(result.is_err(), "unknown keys must be rejected, not ignored");

    let result: Result<ReleaseLedgerConfig, _> = toml::from_str("[surprise]\nvalue = 1\n");
    assert!(result.is_err());
}

// ============================================================================
// SECTION: Range Validation
// ============================================================================

#[test]
fn zero_promotion_window_is_invalid() {
    let config: ReleaseLedgerConfig =
        toml::from_str("[run]\npromotion_window_hours = 0\n").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn oversized_promotion_window_is_invalid() {
    let config: ReleaseLedgerConfig =
        toml::from_str("[run]\npromotion_window_hours = 10000\n").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn empty_qa_alias_is_invalid() {
    let config: ReleaseLedgerConfig = toml::from_str("[run]\nqa_env_alias = \"  \"\n").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn empty_store_root_is_invalid() {
    let config: ReleaseLedgerConfig = toml::from_str("[store]\nroot = \"\"\n").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn oversized_retention_horizon_is_invalid() {
    let config: ReleaseLedgerConfig =
        toml::from_str("[store]\nretention_days = 100000\n").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn zero_cleanup_interval_is_invalid() {
    let config: ReleaseLedgerConfig =
        toml::from_str("[store]\ncleanup_interval_days = 0\n").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn zero_retention_disables_retention_and_stays_valid() {
    let config: ReleaseLedgerConfig = toml::from_str("[store]\nretention_days = 0\n").unwrap();
    config.validate().unwrap();
    assert_eq!(config.run_settings().retention_days, 0);
}
