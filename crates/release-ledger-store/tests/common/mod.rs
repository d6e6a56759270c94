// crates/release-ledger-store/tests/common/mod.rs
// ============================================================================
// Module: Store Test Fixtures
// Description: Shared event builders for store integration tests.
// Purpose: Keep event construction consistent across test files.
// ============================================================================

//! Shared fixtures for store tests.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only helpers; not every test file uses every fixture."
)]

use release_ledger_core::DeploymentEvent;
use release_ledger_core::EventDraft;
use release_ledger_core::EventKind;
use release_ledger_core::Timestamp;

/// Builds a deployment event with a content-derived identifier.
pub fn event(component: &str, to_tag: &str, at: i64) -> DeploymentEvent {
    let draft = EventDraft {
        kind: EventKind::TagChange,
        project_key: "payments".into(),
        env_key: "prod".into(),
        component: component.into(),
        repo: "acme/payments".into(),
        from_tag: "v1.0.0".to_string(),
        to_tag: to_tag.to_string(),
        deployed_at: Some(Timestamp::from_unix_millis(at)),
        deployer: None,
        tag_sha: None,
    };
    DeploymentEvent::derive(draft, Timestamp::from_unix_millis(at)).unwrap()
}
