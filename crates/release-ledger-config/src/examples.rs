// crates/release-ledger-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical examples for Release Ledger configuration. Outputs are
//! deterministic and kept in sync with the validation rules.

/// Returns a canonical example `release-ledger.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[run]
branch_enrichment = true
time_aware_builds = true
promotion_window_hours = 24
# qa_env_alias = "staging"

[store]
root = "ledger-state"
retention_days = 90
cleanup_interval_days = 7
"#,
    )
}
