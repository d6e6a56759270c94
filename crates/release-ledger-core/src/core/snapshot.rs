// crates/release-ledger-core/src/core/snapshot.rs
// ============================================================================
// Module: Release Ledger Snapshots
// Description: Point-in-time deployment state trees per project/environment.
// Purpose: Provide immutable, serializable snapshot records for diffing.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A snapshot captures every tracked project, environment, and component at
//! one instant, as assembled by the upstream fetch/aggregation layer. A
//! snapshot is never mutated after being persisted; the tag-change detector
//! consults only the latest snapshot and its immediate predecessor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BranchName;
use crate::core::identifiers::BuildId;
use crate::core::identifiers::ComponentKey;
use crate::core::identifiers::ComponentName;
use crate::core::identifiers::EnvKey;
use crate::core::identifiers::ProjectKey;
use crate::core::identifiers::RepoName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Component State
// ============================================================================

/// Deployment state of one component at snapshot time.
///
/// # Invariants
/// - `tag` is an opaque version label; an empty string means the component
///   reported no tag and never participates in change detection.
/// - Optional fields are `None` when the upstream payload lacked them;
///   missing values are never inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentState {
    /// Opaque version tag currently deployed.
    pub tag: String,
    /// Deployment timestamp, when reported.
    pub deployed_at: Option<Timestamp>,
    /// Branch the deployed artifact was built from, when reported.
    pub branch: Option<BranchName>,
    /// Source repository for the component.
    pub repo: RepoName,
    /// CI build identifier for the deployed artifact, when reported.
    pub build_id: Option<BuildId>,
    /// CI build finish timestamp, when reported.
    pub build_finished_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Snapshot Trees
// ============================================================================

/// Components of one environment at snapshot time.
///
/// # Invariants
/// - Keyed by component name; `BTreeMap` ordering keeps iteration
///   deterministic across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnvironmentSnapshot {
    /// Component states keyed by component name.
    pub components: BTreeMap<ComponentName, ComponentState>,
}

/// Environments of one project at snapshot time.
///
/// # Invariants
/// - Keyed by environment key; ordering is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectSnapshot {
    /// Environment snapshots keyed by environment key.
    pub environments: BTreeMap<EnvKey, EnvironmentSnapshot>,
}

/// Immutable record of all projects at one instant.
///
/// # Invariants
/// - Never mutated after being persisted.
/// - `taken_at` is supplied by the host that assembled the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Instant the snapshot was assembled.
    pub taken_at: Timestamp,
    /// Project snapshots keyed by project key.
    pub projects: BTreeMap<ProjectKey, ProjectSnapshot>,
}

impl Snapshot {
    /// Creates an empty snapshot taken at the given instant.
    #[must_use]
    pub const fn empty(taken_at: Timestamp) -> Self {
        Self {
            taken_at,
            projects: BTreeMap::new(),
        }
    }

    /// Returns the component state for a key, when present.
    #[must_use]
    pub fn component(&self, key: &ComponentKey) -> Option<&ComponentState> {
        self.projects
            .get(&key.project)?
            .environments
            .get(&key.env)?
            .components
            .get(&key.component)
    }

    /// Iterates all component states with their composite keys.
    pub fn iter_components(&self) -> impl Iterator<Item = (ComponentKey, &ComponentState)> {
        self.projects.iter().flat_map(|(project, project_snapshot)| {
            project_snapshot.environments.iter().flat_map(move |(env, env_snapshot)| {
                env_snapshot.components.iter().map(move |(component, state)| {
                    (
                        ComponentKey {
                            project: project.clone(),
                            env: env.clone(),
                            component: component.clone(),
                        },
                        state,
                    )
                })
            })
        })
    }
}
