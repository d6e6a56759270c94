// crates/release-ledger-config/tests/config_defaults.rs
// ============================================================================
// Module: Config Defaults Tests
// Description: Validate default values and the canonical example.
// Purpose: Keep documented defaults and the example in sync with the model.
// ============================================================================

//! Default-value tests for the configuration model.

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

use release_ledger_config::ReleaseLedgerConfig;
use release_ledger_config::config_toml_example;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn defaults_are_valid_and_documented() {
    let config = ReleaseLedgerConfig::default();
    config.validate().unwrap();

    assert!(config.run.branch_enrichment);
    assert!(config.run.time_aware_builds);
    assert_eq!(config.run.promotion_window_hours, 24);
    assert!(config.run.qa_env_alias.is_none());
    assert_eq!(config.store.root, "ledger-state");
    assert_eq!(config.store.retention_days, 90);
    assert_eq!(config.store.cleanup_interval_days, 7);
}

#[test]
fn empty_document_resolves_to_defaults() {
    let config: ReleaseLedgerConfig = toml_from("");
    config.validate().unwrap();
    assert_eq!(config.store.retention_days, 90);
    assert!(config.run.time_aware_builds);
}

#[test]
fn canonical_example_parses_and_validates() {
    let config: ReleaseLedgerConfig = toml_from(&config_toml_example());
    config.validate().unwrap();
    assert!(config.run.branch_enrichment);
    assert_eq!(config.store.root, "ledger-state");
}

#[test]
fn run_settings_mirror_the_configuration() {
    let config: ReleaseLedgerConfig = toml_from(
        r#"
[run]
branch_enrichment = false
time_aware_builds = true
promotion_window_hours = 48
qa_env_alias = " staging "

[store]
root = "state"
retention_days = 30
cleanup_interval_days = 3
"#,
    );
    config.validate().unwrap();

    let settings = config.run_settings();
    assert!(!settings.toggles.branch_enrichment);
    assert!(settings.toggles.time_aware_builds);
    assert_eq!(settings.promotion_window_hours, 48);
    assert_eq!(settings.qa_env_alias.as_deref(), Some("staging"), "the alias is trimmed");
    assert_eq!(settings.retention_days, 30);
    assert_eq!(settings.cleanup_interval_days, 3);
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn toml_from(content: &str) -> ReleaseLedgerConfig {
    toml::from_str(content).unwrap()
}
