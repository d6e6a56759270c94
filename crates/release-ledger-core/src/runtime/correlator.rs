// crates/release-ledger-core/src/runtime/correlator.rs
// ============================================================================
// Module: Release Ledger Time-Aware Correlator
// Description: PR-to-branch, PR-to-build, and build-to-deployment correlation.
// Purpose: Validate reachability and monotonic time ordering per candidate.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The correlator links merged pull requests to branches, builds, and
//! deployments through three sequential, independently failable stages.
//! Every stage enforces both reachability (the artifact is structurally
//! contained in the later one) and time ordering (the later timestamp is at
//! or after the earlier one). Missing timestamps exclude a candidate, never
//! produce a best-effort guess; each exclusion is returned as a structured
//! warning. Partial correlation is acceptable; wrong correlation is not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::BranchFact;
use crate::core::BranchName;
use crate::core::BuildFact;
use crate::core::BuildId;
use crate::core::CommitSha;
use crate::core::ComponentKey;
use crate::core::CorrelationInput;
use crate::core::PullRequestFact;
use crate::core::RepoName;
use crate::core::TagChangeFact;
use crate::core::TicketId;
use crate::core::Timestamp;
use crate::core::Warning;
use crate::core::WarningKind;
use crate::core::Warnings;

// ============================================================================
// SECTION: Feature Toggles
// ============================================================================

/// Toggles controlling which correlation stages run.
///
/// # Invariants
/// - A disabled stage produces absent outputs, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Enables the PR-to-branch enrichment stage.
    pub branch_enrichment: bool,
    /// Enables the time-aware build-driven path (PR-to-build and
    /// build-to-deployment stages).
    pub time_aware_builds: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            branch_enrichment: true,
            time_aware_builds: true,
        }
    }
}

// ============================================================================
// SECTION: Time-Aware Entries
// ============================================================================

/// A branch validated to contain a PR under time ordering.
///
/// # Invariants
/// - `branch_created_at >= merged_at`; both governing timestamps are
///   carried so consumers can re-verify without recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAwareBranch {
    /// Repository the branch belongs to.
    pub repo: RepoName,
    /// Branch name.
    pub branch: BranchName,
    /// Merge commit the branch contains.
    pub merge_sha: CommitSha,
    /// PR merge instant.
    pub merged_at: Timestamp,
    /// Branch creation instant.
    pub branch_created_at: Timestamp,
}

/// A build validated to contain a PR under time ordering.
///
/// # Invariants
/// - `started_at >= merged_at`; `finished_at` stays `None` when the CI
///   collaborator did not report it, which excludes the build from
///   deployment correlation but not from this list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAwareBuild {
    /// Build identifier.
    pub build_id: BuildId,
    /// Repository the build was produced from.
    pub repo: RepoName,
    /// Branch the build ran on, when reported.
    pub branch: Option<BranchName>,
    /// Merge commit the build contains.
    pub merge_sha: CommitSha,
    /// PR merge instant.
    pub merged_at: Timestamp,
    /// Build start instant.
    pub started_at: Timestamp,
    /// Build finish instant, when reported.
    pub finished_at: Option<Timestamp>,
    /// Version tag of the produced artifact, when reported.
    pub artifact_tag: Option<String>,
}

/// A deployment validated against a concrete build under time ordering.
///
/// # Invariants
/// - `deployed_at >= build_finished_at >= build_started_at >= merged_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAwareDeployment {
    /// Component the deployment landed on.
    pub key: ComponentKey,
    /// Repository the artifact came from.
    pub repo: RepoName,
    /// Build that produced the deployed artifact.
    pub build_id: BuildId,
    /// Tag before the deployment.
    pub from_tag: String,
    /// Deployed artifact tag.
    pub tag: String,
    /// Branch the artifact was built from, when reported.
    pub branch: Option<BranchName>,
    /// PR merge instant.
    pub merged_at: Timestamp,
    /// Build start instant.
    pub build_started_at: Timestamp,
    /// Build finish instant.
    pub build_finished_at: Timestamp,
    /// Deployment instant.
    pub deployed_at: Timestamp,
}

// ============================================================================
// SECTION: Correlation Outcome
// ============================================================================

/// Result of one correlation attempt.
///
/// # Invariants
/// - `Excluded` carries the reason so the caller can aggregate it into the
///   warnings collection; exclusions are never discarded silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationOutcome<T> {
    /// The candidate passed reachability and time-ordering checks.
    Linked(T),
    /// The candidate was excluded.
    Excluded(ExclusionReason),
}

/// Reason a correlation candidate was excluded.
///
/// # Invariants
/// - Variants are stable for warning classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// A required timestamp was absent on the named side.
    MissingTimestamp {
        /// Side of the comparison that lacked a timestamp.
        side: &'static str,
    },
    /// The later-stage timestamp preceded the earlier-stage one.
    OrderingViolation {
        /// Earlier-stage timestamp.
        earlier: Timestamp,
        /// Later-stage timestamp that preceded it.
        later: Timestamp,
    },
}

impl ExclusionReason {
    /// Returns the warning kind this exclusion maps to.
    #[must_use]
    pub const fn warning_kind(&self) -> WarningKind {
        match self {
            Self::MissingTimestamp {
                ..
            } => WarningKind::MissingEvidence,
            Self::OrderingViolation {
                ..
            } => WarningKind::OrderingViolation,
        }
    }

    /// Renders the exclusion for a warning message.
    fn describe(&self, candidate: &str) -> String {
        match self {
            Self::MissingTimestamp {
                side,
            } => {
                format!("{candidate}: excluded, missing {side} timestamp")
            }
            Self::OrderingViolation {
                earlier,
                later,
            } => {
                format!("{candidate}: excluded, {later} precedes {earlier}")
            }
        }
    }
}

// ============================================================================
// SECTION: Per-Ticket Output
// ============================================================================

/// Correlation output for one ticket.
///
/// # Invariants
/// - Lists only contain entries that passed both reachability and time
///   ordering for their stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TicketCorrelation {
    /// Branches validated to contain the ticket's merged PRs.
    pub time_aware_branches: Vec<TimeAwareBranch>,
    /// Builds validated to contain the ticket's merged PRs.
    pub time_aware_builds: Vec<TimeAwareBuild>,
    /// Deployments validated against concrete builds.
    pub time_aware_deployments: Vec<TimeAwareDeployment>,
}

/// Full correlator output for one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorrelationResult {
    /// Per-ticket correlation entries.
    pub tickets: BTreeMap<TicketId, TicketCorrelation>,
    /// Structured exclusion warnings.
    pub warnings: Warnings,
}

// ============================================================================
// SECTION: Stage Checks
// ============================================================================

/// Stage 1: validates that a branch contains a PR under time ordering.
///
/// A branch created before the PR was merged is excluded even when commit
/// reachability says yes; long-lived branches absorb unrelated history and
/// must not produce "included in release" claims.
#[must_use]
pub fn correlate_branch(
    pr: &PullRequestFact,
    branch: &BranchFact,
) -> CorrelationOutcome<TimeAwareBranch> {
    let Some(merged_at) = pr.merged_at else {
        return CorrelationOutcome::Excluded(ExclusionReason::MissingTimestamp {
            side: "pr merge",
        });
    };
    let Some(created_at) = branch.created_at else {
        return CorrelationOutcome::Excluded(ExclusionReason::MissingTimestamp {
            side: "branch creation",
        });
    };
    if created_at < merged_at {
        return CorrelationOutcome::Excluded(ExclusionReason::OrderingViolation {
            earlier: merged_at,
            later: created_at,
        });
    }
    CorrelationOutcome::Linked(TimeAwareBranch {
        repo: branch.repo.clone(),
        branch: branch.name.clone(),
        merge_sha: pr.merge_sha.clone(),
        merged_at,
        branch_created_at: created_at,
    })
}

/// Stage 2: validates that a build contains a PR under time ordering.
///
/// Applies uniformly to any branch name; structural containment is
/// established by the caller before this check runs.
#[must_use]
pub fn correlate_build(
    pr: &PullRequestFact,
    build: &BuildFact,
) -> CorrelationOutcome<TimeAwareBuild> {
    let Some(merged_at) = pr.merged_at else {
        return CorrelationOutcome::Excluded(ExclusionReason::MissingTimestamp {
            side: "pr merge",
        });
    };
    let Some(started_at) = build.started_at else {
        return CorrelationOutcome::Excluded(ExclusionReason::MissingTimestamp {
            side: "build start",
        });
    };
    if started_at < merged_at {
        return CorrelationOutcome::Excluded(ExclusionReason::OrderingViolation {
            earlier: merged_at,
            later: started_at,
        });
    }
    CorrelationOutcome::Linked(TimeAwareBuild {
        build_id: build.build_id.clone(),
        repo: build.repo.clone(),
        branch: build.branch.clone(),
        merge_sha: pr.merge_sha.clone(),
        merged_at,
        started_at,
        finished_at: build.finished_at,
        artifact_tag: build.artifact_tag.clone(),
    })
}

/// Stage 3: validates a deployment against a concrete, finished build.
///
/// A deployment fact with no timestamp is not a deployment fact; it is
/// dropped here with a missing-evidence exclusion.
#[must_use]
pub fn correlate_deployment(
    build: &TimeAwareBuild,
    fact: &TagChangeFact,
) -> CorrelationOutcome<TimeAwareDeployment> {
    let Some(deployed_at) = fact.deployed_at else {
        return CorrelationOutcome::Excluded(ExclusionReason::MissingTimestamp {
            side: "deployment",
        });
    };
    let Some(finished_at) = build.finished_at else {
        return CorrelationOutcome::Excluded(ExclusionReason::MissingTimestamp {
            side: "build finish",
        });
    };
    if deployed_at < finished_at {
        return CorrelationOutcome::Excluded(ExclusionReason::OrderingViolation {
            earlier: finished_at,
            later: deployed_at,
        });
    }
    CorrelationOutcome::Linked(TimeAwareDeployment {
        key: fact.key.clone(),
        repo: fact.repo.clone(),
        build_id: build.build_id.clone(),
        from_tag: fact.from_tag.clone(),
        tag: fact.to_tag.clone(),
        branch: build.branch.clone().or_else(|| fact.branch.clone()),
        merged_at: build.merged_at,
        build_started_at: build.started_at,
        build_finished_at: finished_at,
        deployed_at,
    })
}

// ============================================================================
// SECTION: Correlator
// ============================================================================

/// Runs the three correlation stages over one run's facts.
///
/// Stages are independently retriable: absent branch data leaves stage 1
/// empty without preventing stages 2 and 3 from producing results from
/// whatever data is available.
#[must_use]
pub fn correlate(
    input: &CorrelationInput,
    tag_changes: &BTreeMap<ComponentKey, TagChangeFact>,
    toggles: FeatureToggles,
) -> CorrelationResult {
    let mut result = CorrelationResult::default();

    for pr in &input.pull_requests {
        if pr.tickets.is_empty() {
            continue;
        }

        let branches = if toggles.branch_enrichment {
            correlate_pr_branches(pr, input, &mut result.warnings)
        } else {
            Vec::new()
        };

        let (builds, deployments) = if toggles.time_aware_builds {
            let builds = correlate_pr_builds(pr, input, &branches, &mut result.warnings);
            let deployments = correlate_build_deployments(&builds, tag_changes, pr, &mut result.warnings);
            (builds, deployments)
        } else {
            (Vec::new(), Vec::new())
        };

        for ticket in &pr.tickets {
            let entry = result.tickets.entry(ticket.clone()).or_default();
            entry.time_aware_branches.extend(branches.iter().cloned());
            entry.time_aware_builds.extend(builds.iter().cloned());
            entry.time_aware_deployments.extend(deployments.iter().cloned());
        }
    }

    for entry in result.tickets.values_mut() {
        entry.time_aware_deployments.sort_by_key(|deployment| deployment.deployed_at);
    }

    result
}

/// Stage 1 sweep: branches in the PR's repo whose tips reach the merge SHA.
fn correlate_pr_branches(
    pr: &PullRequestFact,
    input: &CorrelationInput,
    warnings: &mut Warnings,
) -> Vec<TimeAwareBranch> {
    let mut linked = Vec::new();
    for branch in &input.branches {
        if branch.repo != pr.repo || !branch.contains.contains(&pr.merge_sha) {
            continue;
        }
        match correlate_branch(pr, branch) {
            CorrelationOutcome::Linked(entry) => linked.push(entry),
            CorrelationOutcome::Excluded(reason) => {
                push_exclusion_warnings(pr, &reason, &format!("branch {}", branch.name), warnings);
            }
        }
    }
    linked
}

/// Stage 2 sweep: builds on the PR's base ref or a stage-1 branch.
fn correlate_pr_builds(
    pr: &PullRequestFact,
    input: &CorrelationInput,
    branches: &[TimeAwareBranch],
    warnings: &mut Warnings,
) -> Vec<TimeAwareBuild> {
    let mut linked = Vec::new();
    for build in &input.builds {
        if build.repo != pr.repo || !build_contains_pr(pr, build, branches) {
            continue;
        }
        match correlate_build(pr, build) {
            CorrelationOutcome::Linked(entry) => linked.push(entry),
            CorrelationOutcome::Excluded(reason) => {
                push_exclusion_warnings(pr, &reason, &format!("build {}", build.build_id), warnings);
            }
        }
    }
    linked
}

/// Stage 3 sweep: tag changes whose new tag matches a build artifact.
fn correlate_build_deployments(
    builds: &[TimeAwareBuild],
    tag_changes: &BTreeMap<ComponentKey, TagChangeFact>,
    pr: &PullRequestFact,
    warnings: &mut Warnings,
) -> Vec<TimeAwareDeployment> {
    let mut linked = Vec::new();
    for build in builds {
        let Some(artifact_tag) = &build.artifact_tag else {
            continue;
        };
        for fact in tag_changes.values() {
            if fact.repo != build.repo || fact.to_tag != *artifact_tag {
                continue;
            }
            match correlate_deployment(build, fact) {
                CorrelationOutcome::Linked(entry) => linked.push(entry),
                CorrelationOutcome::Excluded(reason) => {
                    push_exclusion_warnings(pr, &reason, &format!("deployment {}", fact.key), warnings);
                }
            }
        }
    }
    linked
}

/// Returns whether a build structurally contains the PR.
///
/// Containment holds when the build ran on the PR's base ref or on a branch
/// already validated by stage 1. A build with no branch metadata cannot
/// establish containment and is skipped (fail closed).
fn build_contains_pr(pr: &PullRequestFact, build: &BuildFact, branches: &[TimeAwareBranch]) -> bool {
    let Some(build_branch) = &build.branch else {
        return false;
    };
    if let Some(base_ref) = &pr.base_ref
        && base_ref == build_branch
    {
        return true;
    }
    branches.iter().any(|entry| entry.branch == *build_branch)
}

/// Aggregates one exclusion into the warnings collection per affected ticket.
fn push_exclusion_warnings(
    pr: &PullRequestFact,
    reason: &ExclusionReason,
    candidate: &str,
    warnings: &mut Warnings,
) {
    let message = reason.describe(candidate);
    for ticket in &pr.tickets {
        warnings.push(Warning::for_ticket(reason.warning_kind(), ticket.clone(), message.clone()));
    }
}
