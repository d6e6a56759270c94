// crates/release-ledger-core/tests/correlator.rs
// ============================================================================
// Module: Time-Aware Correlator Tests
// Description: Validate reachability plus time-ordering across all stages.
// Purpose: Ensure fail-closed exclusions and stage independence.
// ============================================================================

//! Correlator tests covering the PR-to-branch, PR-to-build, and
//! build-to-deployment stages, feature toggles, and structured exclusions.

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

use release_ledger_core::BranchFact;
use release_ledger_core::BuildFact;
use release_ledger_core::ComponentKey;
use release_ledger_core::CorrelationInput;
use release_ledger_core::FeatureToggles;
use release_ledger_core::PullRequestFact;
use release_ledger_core::TagChangeFact;
use release_ledger_core::TicketId;
use release_ledger_core::Timestamp;
use release_ledger_core::WarningKind;
use release_ledger_core::correlate;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const MERGED_AT: i64 = 10_000;
const BRANCH_CREATED_AT: i64 = 20_000;
const BUILD_STARTED_AT: i64 = 30_000;
const BUILD_FINISHED_AT: i64 = 40_000;
const DEPLOYED_AT: i64 = 50_000;

fn ticket() -> TicketId {
    TicketId::new("PAY-101")
}

fn pr(merged_at: Option<i64>) -> PullRequestFact {
    PullRequestFact {
        repo: "acme/payments".into(),
        merge_sha: "abc123".into(),
        merged_at: merged_at.map(Timestamp::from_unix_millis),
        base_ref: Some("main".into()),
        tickets: vec![ticket()],
    }
}

fn branch(name: &str, created_at: Option<i64>, contains_merge: bool) -> BranchFact {
    BranchFact {
        repo: "acme/payments".into(),
        name: name.into(),
        created_at: created_at.map(Timestamp::from_unix_millis),
        tip_sha: Some("tip999".into()),
        contains: if contains_merge {
            vec!["abc123".into()]
        } else {
            Vec::new()
        },
    }
}

fn build(branch: &str, started_at: Option<i64>, finished_at: Option<i64>) -> BuildFact {
    BuildFact {
        build_id: "build-77".into(),
        repo: "acme/payments".into(),
        branch: Some(branch.into()),
        started_at: started_at.map(Timestamp::from_unix_millis),
        finished_at: finished_at.map(Timestamp::from_unix_millis),
        artifact_tag: Some("v1.0.1".to_string()),
    }
}

fn tag_change(deployed_at: Option<i64>) -> BTreeMap<ComponentKey, TagChangeFact> {
    let key = ComponentKey::new("payments", "prod", "api");
    let fact = TagChangeFact {
        key: key.clone(),
        from_tag: "v1.0.0".to_string(),
        to_tag: "v1.0.1".to_string(),
        deployed_at: deployed_at.map(Timestamp::from_unix_millis),
        repo: "acme/payments".into(),
        branch: Some("main".into()),
    };
    BTreeMap::from([(key, fact)])
}

fn full_input() -> CorrelationInput {
    CorrelationInput {
        pull_requests: vec![pr(Some(MERGED_AT))],
        branches: vec![branch("release/1.0", Some(BRANCH_CREATED_AT), true)],
        builds: vec![build("main", Some(BUILD_STARTED_AT), Some(BUILD_FINISHED_AT))],
    }
}

// ============================================================================
// SECTION: Full Chain
// ============================================================================

#[test]
fn full_chain_produces_time_aware_deployment() {
    let result =
        correlate(&full_input(), &tag_change(Some(DEPLOYED_AT)), FeatureToggles::default());

    let entry = result.tickets.get(&ticket()).unwrap();
    assert_eq!(entry.time_aware_branches.len(), 1);
    assert_eq!(entry.time_aware_builds.len(), 1);
    assert_eq!(entry.time_aware_deployments.len(), 1);

    let deployment = &entry.time_aware_deployments[0];
    assert!(deployment.deployed_at >= deployment.build_finished_at);
    assert!(deployment.build_finished_at >= deployment.build_started_at);
    assert!(deployment.build_started_at >= deployment.merged_at);
    assert_eq!(deployment.tag, "v1.0.1");
}

#[test]
fn every_emitted_deployment_carries_ordered_timestamps() {
    let result =
        correlate(&full_input(), &tag_change(Some(DEPLOYED_AT)), FeatureToggles::default());
    for entry in result.tickets.values() {
        for deployment in &entry.time_aware_deployments {
            assert!(
                deployment.deployed_at >= deployment.build_finished_at
                    && deployment.build_finished_at >= deployment.build_started_at
                    && deployment.build_started_at >= deployment.merged_at,
                "time-ordering invariant violated"
            );
        }
    }
}

// ============================================================================
// SECTION: PR-to-Branch Stage
// ============================================================================

#[test]
fn branch_created_before_merge_is_excluded_despite_reachability() {
    // Branch created at T0, PR merged at T1 > T0, merge later reachable
    // from the branch tip: inclusion must be rejected on branch creation
    // time alone.
    let mut input = full_input();
    input.branches = vec![branch("release/0.9", Some(MERGED_AT - 5_000), true)];

    let result = correlate(&input, &BTreeMap::new(), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_branches.is_empty());
    assert!(result.warnings.contains_kind(WarningKind::OrderingViolation));
}

#[test]
fn unreachable_branch_is_not_a_candidate() {
    let mut input = full_input();
    input.branches = vec![branch("release/1.0", Some(BRANCH_CREATED_AT), false)];

    let result = correlate(&input, &BTreeMap::new(), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_branches.is_empty());
    assert!(
        !result.warnings.contains_kind(WarningKind::OrderingViolation),
        "a structurally unlinked branch is not an exclusion"
    );
}

#[test]
fn branch_without_creation_time_is_excluded_with_warning() {
    let mut input = full_input();
    input.branches = vec![branch("release/1.0", None, true)];

    let result = correlate(&input, &BTreeMap::new(), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_branches.is_empty());
    assert!(result.warnings.contains_kind(WarningKind::MissingEvidence));
}

// ============================================================================
// SECTION: PR-to-Build Stage
// ============================================================================

#[test]
fn build_started_before_merge_is_excluded() {
    let mut input = full_input();
    input.builds = vec![build("main", Some(MERGED_AT - 1), Some(BUILD_FINISHED_AT))];

    let result = correlate(&input, &BTreeMap::new(), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_builds.is_empty());
    assert!(result.warnings.contains_kind(WarningKind::OrderingViolation));
}

#[test]
fn build_on_stage_one_branch_is_linked() {
    let mut input = full_input();
    input.builds = vec![build("release/1.0", Some(BUILD_STARTED_AT), Some(BUILD_FINISHED_AT))];

    let result = correlate(&input, &BTreeMap::new(), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert_eq!(entry.time_aware_builds.len(), 1, "stage-1 branches extend build containment");
}

#[test]
fn build_without_branch_metadata_cannot_establish_containment() {
    let mut input = full_input();
    input.builds = vec![BuildFact {
        branch: None,
        ..build("main", Some(BUILD_STARTED_AT), Some(BUILD_FINISHED_AT))
    }];

    let result = correlate(&input, &BTreeMap::new(), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_builds.is_empty());
}

#[test]
fn missing_branch_data_does_not_block_build_stage() {
    // Stage independence: with no branch facts at all, builds on the PR
    // base ref still correlate.
    let mut input = full_input();
    input.branches = Vec::new();

    let result =
        correlate(&input, &tag_change(Some(DEPLOYED_AT)), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_branches.is_empty());
    assert_eq!(entry.time_aware_builds.len(), 1);
    assert_eq!(entry.time_aware_deployments.len(), 1);
}

// ============================================================================
// SECTION: Build-to-Deployment Stage
// ============================================================================

#[test]
fn deployment_without_timestamp_is_dropped() {
    let result = correlate(&full_input(), &tag_change(None), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_deployments.is_empty());
    assert!(result.warnings.contains_kind(WarningKind::MissingEvidence));
}

#[test]
fn deployment_before_build_finish_is_excluded() {
    let result = correlate(
        &full_input(),
        &tag_change(Some(BUILD_FINISHED_AT - 1)),
        FeatureToggles::default(),
    );
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_deployments.is_empty());
    assert!(result.warnings.contains_kind(WarningKind::OrderingViolation));
}

#[test]
fn unfinished_build_supports_no_deployment() {
    let mut input = full_input();
    input.builds = vec![build("main", Some(BUILD_STARTED_AT), None)];

    let result =
        correlate(&input, &tag_change(Some(DEPLOYED_AT)), FeatureToggles::default());
    let entry = result.tickets.get(&ticket()).unwrap();
    assert_eq!(entry.time_aware_builds.len(), 1, "the build itself stays time-aware");
    assert!(entry.time_aware_deployments.is_empty());
    assert!(result.warnings.contains_kind(WarningKind::MissingEvidence));
}

// ============================================================================
// SECTION: Feature Toggles
// ============================================================================

#[test]
fn disabled_branch_enrichment_yields_absent_branches() {
    let toggles = FeatureToggles {
        branch_enrichment: false,
        time_aware_builds: true,
    };
    let result = correlate(&full_input(), &tag_change(Some(DEPLOYED_AT)), toggles);
    let entry = result.tickets.get(&ticket()).unwrap();
    assert!(entry.time_aware_branches.is_empty());
    assert_eq!(entry.time_aware_builds.len(), 1, "build path keeps running");
}

#[test]
fn disabled_build_path_yields_absent_builds_and_deployments() {
    let toggles = FeatureToggles {
        branch_enrichment: true,
        time_aware_builds: false,
    };
    let result = correlate(&full_input(), &tag_change(Some(DEPLOYED_AT)), toggles);
    let entry = result.tickets.get(&ticket()).unwrap();
    assert_eq!(entry.time_aware_branches.len(), 1);
    assert!(entry.time_aware_builds.is_empty());
    assert!(entry.time_aware_deployments.is_empty());
}

// ============================================================================
// SECTION: Ticket Scoping
// ============================================================================

#[test]
fn pr_without_tickets_is_skipped() {
    let mut input = full_input();
    input.pull_requests[0].tickets = Vec::new();

    let result =
        correlate(&input, &tag_change(Some(DEPLOYED_AT)), FeatureToggles::default());
    assert!(result.tickets.is_empty());
}

#[test]
fn multi_ticket_pr_fans_out_to_every_ticket() {
    let mut input = full_input();
    input.pull_requests[0].tickets = vec![TicketId::new("PAY-101"), TicketId::new("PAY-202")];

    let result =
        correlate(&input, &tag_change(Some(DEPLOYED_AT)), FeatureToggles::default());
    assert_eq!(result.tickets.len(), 2);
    for entry in result.tickets.values() {
        assert_eq!(entry.time_aware_deployments.len(), 1);
    }
}
