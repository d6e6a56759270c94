// crates/release-ledger-core/src/core/facts.rs
// ============================================================================
// Module: Release Ledger Facts
// Description: Derived tag-change facts and externally supplied PR/branch/build facts.
// Purpose: Provide fully typed fact records with explicit optional fields.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Facts are the inputs to the time-aware correlator. Tag-change facts are
//! derived by diffing snapshots; pull-request, branch, and build facts arrive
//! from repository/CI collaborators. Every field that may be unavailable is
//! an explicit `Option`; absence is a distinct representable state, never an
//! empty string standing in for "unknown". Facts are recomputed each run and
//! are not persisted directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BranchName;
use crate::core::identifiers::BuildId;
use crate::core::identifiers::CommitSha;
use crate::core::identifiers::ComponentKey;
use crate::core::identifiers::RepoName;
use crate::core::identifiers::TicketId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Tag Change Facts
// ============================================================================

/// A detected tag transition for one component.
///
/// # Invariants
/// - `from_tag` and `to_tag` are both non-empty and differ; the detector
///   never emits a fact otherwise.
/// - `deployed_at` is the snapshot-reported deployment instant; a fact with
///   no timestamp never becomes a deployment correlation candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChangeFact {
    /// Component the change was observed on.
    pub key: ComponentKey,
    /// Tag recorded in the previous snapshot.
    pub from_tag: String,
    /// Tag recorded in the current snapshot.
    pub to_tag: String,
    /// Deployment timestamp, when reported.
    pub deployed_at: Option<Timestamp>,
    /// Source repository for the component.
    pub repo: RepoName,
    /// Branch the deployed artifact was built from, when reported.
    pub branch: Option<BranchName>,
}

// ============================================================================
// SECTION: External Facts
// ============================================================================

/// A merged pull request, as reported by the repository collaborator.
///
/// # Invariants
/// - Immutable once merged; `merge_sha` identifies the merge commit.
/// - `tickets` lists the issue-tracker tickets the PR resolves; an empty
///   list means the PR correlates to no ticket and is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestFact {
    /// Repository the PR was merged into.
    pub repo: RepoName,
    /// Merge commit SHA.
    pub merge_sha: CommitSha,
    /// Merge timestamp, when reported.
    pub merged_at: Option<Timestamp>,
    /// Base branch the PR targeted, when reported.
    pub base_ref: Option<BranchName>,
    /// Tickets the PR resolves.
    pub tickets: Vec<TicketId>,
}

/// A branch observation, as reported by the repository collaborator.
///
/// # Invariants
/// - `contains` lists merge commits the collaborator determined to be
///   reachable from the branch tip; the core never performs git traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchFact {
    /// Repository the branch belongs to.
    pub repo: RepoName,
    /// Branch name.
    pub name: BranchName,
    /// Branch creation timestamp, when reported.
    pub created_at: Option<Timestamp>,
    /// Branch tip SHA, when reported.
    pub tip_sha: Option<CommitSha>,
    /// Merge commits reachable from the branch tip.
    pub contains: Vec<CommitSha>,
}

/// A CI build observation, as reported by the CI collaborator.
///
/// # Invariants
/// - Partially populated fields stay `None`; the correlator excludes rather
///   than infers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFact {
    /// Build identifier.
    pub build_id: BuildId,
    /// Repository the build was produced from.
    pub repo: RepoName,
    /// Branch the build ran on, when reported.
    pub branch: Option<BranchName>,
    /// Build start timestamp, when reported.
    pub started_at: Option<Timestamp>,
    /// Build finish timestamp, when reported.
    pub finished_at: Option<Timestamp>,
    /// Version tag of the produced artifact, when reported.
    pub artifact_tag: Option<String>,
}

// ============================================================================
// SECTION: Correlation Input
// ============================================================================

/// External facts supplied to one correlation run.
///
/// # Invariants
/// - Contents are snapshots taken at run start; the correlator never mutates
///   them and never fetches more mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CorrelationInput {
    /// Merged pull requests in scope for this run.
    pub pull_requests: Vec<PullRequestFact>,
    /// Branch observations in scope for this run.
    pub branches: Vec<BranchFact>,
    /// Build observations in scope for this run.
    pub builds: Vec<BuildFact>,
}
