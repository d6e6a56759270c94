// crates/release-ledger-core/src/core/events.rs
// ============================================================================
// Module: Release Ledger Deployment Events
// Description: Durable append-only deployment and tag-change event records.
// Purpose: Provide self-contained, content-addressed events for the log.
// Dependencies: crate::core::{facts, hashing, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Deployment events are the durable output of a run. Each event is
//! self-contained and independently parseable (one JSON object per log line),
//! and its identifier is derived from the event content so replayed appends
//! deduplicate instead of duplicating history. Once appended an event is
//! never mutated or deleted in place; corrections are made by appending
//! superseding events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::facts::TagChangeFact;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::CommitSha;
use crate::core::identifiers::ComponentName;
use crate::core::identifiers::EnvKey;
use crate::core::identifiers::ProjectKey;
use crate::core::identifiers::RepoName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Event Identifier
// ============================================================================

/// Content-derived, stable event identifier.
///
/// # Invariants
/// - Lowercase hex SHA-256 over the canonical JSON of the event body
///   (everything except the identifier itself).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Event Kind
// ============================================================================

/// Kind discriminator for durable events.
///
/// # Invariants
/// - Wire values are the fixed uppercase tags `DEPLOYMENT` and `TAG_CHANGE`
///   and must never change; the legacy migrator matches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A correlated deployment with build provenance.
    #[serde(rename = "DEPLOYMENT")]
    Deployment,
    /// A raw tag transition observed between snapshots.
    #[serde(rename = "TAG_CHANGE")]
    TagChange,
}

// ============================================================================
// SECTION: Deployment Event
// ============================================================================

/// Durable deployment-relevant event.
///
/// # Invariants
/// - `id` matches the canonical hash of the event body; [`DeploymentEvent::derive`]
///   is the only constructor that produces consistent identifiers.
/// - Once appended, never mutated or deleted in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEvent {
    /// Content-derived, stable identifier.
    pub id: EventId,
    /// Event kind discriminator.
    pub kind: EventKind,
    /// Project key.
    pub project_key: ProjectKey,
    /// Environment key.
    pub env_key: EnvKey,
    /// Component name.
    pub component: ComponentName,
    /// Source repository.
    pub repo: RepoName,
    /// Tag before the change.
    pub from_tag: String,
    /// Tag after the change.
    pub to_tag: String,
    /// Deployment timestamp, when reported.
    pub deployed_at: Option<Timestamp>,
    /// Deploying actor, when reported.
    pub deployer: Option<String>,
    /// SHA the tag points at, when reported.
    pub tag_sha: Option<CommitSha>,
    /// Instant the event was recorded.
    pub at: Timestamp,
}

/// Event body hashed to derive the identifier.
///
/// # Invariants
/// - Field set and serialization must stay in lockstep with
///   [`DeploymentEvent`] minus `id`; identifier stability depends on it.
#[derive(Serialize)]
struct EventBody<'a> {
    /// Event kind discriminator.
    kind: EventKind,
    /// Project key.
    project_key: &'a ProjectKey,
    /// Environment key.
    env_key: &'a EnvKey,
    /// Component name.
    component: &'a ComponentName,
    /// Source repository.
    repo: &'a RepoName,
    /// Tag before the change.
    from_tag: &'a str,
    /// Tag after the change.
    to_tag: &'a str,
    /// Deployment timestamp, when reported.
    deployed_at: Option<Timestamp>,
    /// Deploying actor, when reported.
    deployer: Option<&'a str>,
    /// SHA the tag points at, when reported.
    tag_sha: Option<&'a CommitSha>,
}

/// Inputs for deriving a deployment event.
///
/// # Invariants
/// - `at` is excluded from the identifier so re-recording the same fact in a
///   later run deduplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Event kind discriminator.
    pub kind: EventKind,
    /// Project key.
    pub project_key: ProjectKey,
    /// Environment key.
    pub env_key: EnvKey,
    /// Component name.
    pub component: ComponentName,
    /// Source repository.
    pub repo: RepoName,
    /// Tag before the change.
    pub from_tag: String,
    /// Tag after the change.
    pub to_tag: String,
    /// Deployment timestamp, when reported.
    pub deployed_at: Option<Timestamp>,
    /// Deploying actor, when reported.
    pub deployer: Option<String>,
    /// SHA the tag points at, when reported.
    pub tag_sha: Option<CommitSha>,
}

impl EventDraft {
    /// Builds a tag-change draft from a detected fact.
    #[must_use]
    pub fn from_tag_change(fact: &TagChangeFact) -> Self {
        Self {
            kind: EventKind::TagChange,
            project_key: fact.key.project.clone(),
            env_key: fact.key.env.clone(),
            component: fact.key.component.clone(),
            repo: fact.repo.clone(),
            from_tag: fact.from_tag.clone(),
            to_tag: fact.to_tag.clone(),
            deployed_at: fact.deployed_at,
            deployer: None,
            tag_sha: None,
        }
    }
}

impl DeploymentEvent {
    /// Derives a deployment event with a content-derived identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the event body cannot be canonicalized.
    pub fn derive(draft: EventDraft, at: Timestamp) -> Result<Self, HashError> {
        let body = EventBody {
            kind: draft.kind,
            project_key: &draft.project_key,
            env_key: &draft.env_key,
            component: &draft.component,
            repo: &draft.repo,
            from_tag: &draft.from_tag,
            to_tag: &draft.to_tag,
            deployed_at: draft.deployed_at,
            deployer: draft.deployer.as_deref(),
            tag_sha: draft.tag_sha.as_ref(),
        };
        let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &body)?;
        Ok(Self {
            id: EventId(digest.value),
            kind: draft.kind,
            project_key: draft.project_key,
            env_key: draft.env_key,
            component: draft.component,
            repo: draft.repo,
            from_tag: draft.from_tag,
            to_tag: draft.to_tag,
            deployed_at: draft.deployed_at,
            deployer: draft.deployer,
            tag_sha: draft.tag_sha,
            at,
        })
    }
}
