// crates/release-ledger-core/tests/proptest_ordering.rs
// ============================================================================
// Module: Ordering Property-Based Tests
// Description: Property tests for time-ordering and version comparison.
// Purpose: Detect invariant violations across wide input ranges.
// ============================================================================

//! Property-based tests for the time-ordering invariant and the version
//! comparator.

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

use std::collections::BTreeMap;

use proptest::prelude::*;
use release_ledger_core::BuildFact;
use release_ledger_core::ComponentKey;
use release_ledger_core::CorrelationInput;
use release_ledger_core::FeatureToggles;
use release_ledger_core::PullRequestFact;
use release_ledger_core::TagChangeFact;
use release_ledger_core::Timestamp;
use release_ledger_core::VersionOrder;
use release_ledger_core::compare_tags;
use release_ledger_core::correlate;

// ============================================================================
// SECTION: Strategies
// ============================================================================

/// Optional timestamp in a bounded range, with `None` well represented.
fn timestamp_strategy() -> impl Strategy<Value = Option<Timestamp>> {
    prop_oneof![
        3 => (0_i64 .. 1_000_000).prop_map(|millis| Some(Timestamp::from_unix_millis(millis))),
        1 => Just(None),
    ]
}

/// Dotted numeric version core with an optional pre-release tail.
fn version_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(0_u64 .. 40, 1 .. 4),
        prop_oneof![Just(None), "[a-z]{1,3}[0-9]{0,2}".prop_map(Some)],
    )
        .prop_map(|(core, pre)| {
            let core_text =
                core.iter().map(ToString::to_string).collect::<Vec<_>>().join(".");
            match pre {
                Some(tail) => format!("v{core_text}-{tail}"),
                None => format!("v{core_text}"),
            }
        })
}

// ============================================================================
// SECTION: Fixture Assembly
// ============================================================================

fn input_from(
    merged_at: Option<Timestamp>,
    started_at: Option<Timestamp>,
    finished_at: Option<Timestamp>,
) -> CorrelationInput {
    CorrelationInput {
        pull_requests: vec![PullRequestFact {
            repo: "acme/payments".into(),
            merge_sha: "abc123".into(),
            merged_at,
            base_ref: Some("main".into()),
            tickets: vec!["PAY-101".into()],
        }],
        branches: Vec::new(),
        builds: vec![BuildFact {
            build_id: "build-77".into(),
            repo: "acme/payments".into(),
            branch: Some("main".into()),
            started_at,
            finished_at,
            artifact_tag: Some("v1.0.1".to_string()),
        }],
    }
}

fn tag_changes_from(deployed_at: Option<Timestamp>) -> BTreeMap<ComponentKey, TagChangeFact> {
    let key = ComponentKey::new("payments", "prod", "api");
    let fact = TagChangeFact {
        key: key.clone(),
        from_tag: "v1.0.0".to_string(),
        to_tag: "v1.0.1".to_string(),
        deployed_at,
        repo: "acme/payments".into(),
        branch: Some("main".into()),
    };
    BTreeMap::from([(key, fact)])
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn emitted_deployments_always_satisfy_the_ordering_chain(
        merged_at in timestamp_strategy(),
        started_at in timestamp_strategy(),
        finished_at in timestamp_strategy(),
        deployed_at in timestamp_strategy(),
    ) {
        let input = input_from(merged_at, started_at, finished_at);
        let tag_changes = tag_changes_from(deployed_at);
        let result = correlate(&input, &tag_changes, FeatureToggles::default());

        for entry in result.tickets.values() {
            for deployment in &entry.time_aware_deployments {
                prop_assert!(deployment.deployed_at >= deployment.build_finished_at);
                prop_assert!(deployment.build_finished_at >= deployment.build_started_at);
                prop_assert!(deployment.build_started_at >= deployment.merged_at);
            }
        }
    }

    #[test]
    fn missing_timestamps_never_produce_deployments(
        started_at in timestamp_strategy(),
        finished_at in timestamp_strategy(),
        deployed_at in timestamp_strategy(),
    ) {
        let input = input_from(None, started_at, finished_at);
        let tag_changes = tag_changes_from(deployed_at);
        let result = correlate(&input, &tag_changes, FeatureToggles::default());

        for entry in result.tickets.values() {
            prop_assert!(entry.time_aware_deployments.is_empty());
            prop_assert!(entry.time_aware_builds.is_empty());
        }
    }

    #[test]
    fn version_comparison_is_antisymmetric(
        left in version_strategy(),
        right in version_strategy(),
    ) {
        let forward = compare_tags(&left, &right);
        let backward = compare_tags(&right, &left);
        match (forward, backward) {
            (VersionOrder::Rollback, other) => prop_assert_eq!(other, VersionOrder::Forward),
            (VersionOrder::Unknown, other) => prop_assert_eq!(other, VersionOrder::Unknown),
            (VersionOrder::Forward, VersionOrder::Unknown) => {
                prop_assert!(false, "parsable pair degraded to unknown");
            }
            (VersionOrder::Forward, _) => {}
        }
    }

    #[test]
    fn version_comparison_never_calls_equal_tags_a_rollback(tag in version_strategy()) {
        prop_assert_eq!(compare_tags(&tag, &tag), VersionOrder::Forward);
    }

    #[test]
    fn unparsable_tags_always_yield_unknown(noise in "[a-z]{1,8}", tag in version_strategy()) {
        prop_assert_eq!(compare_tags(&noise, &tag), VersionOrder::Unknown);
        prop_assert_eq!(compare_tags(&tag, &noise), VersionOrder::Unknown);
    }
}
