// crates/release-ledger-core/src/core/presence.rs
// ============================================================================
// Module: Release Ledger Ticket Presence
// Description: Stage classification, confidence tiers, and presence state.
// Purpose: Provide the per-(ticket, stage) state machine and its evidence.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Ticket presence answers "which tickets have reached which environments,
//! and when, and with what confidence". Environment names are classified
//! into the four canonical stages; per-stage presence follows a small state
//! machine whose only path back from `present` is an explicit rollback.
//! `present = false` is the default and is never inferred from absence of
//! data when history exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BranchName;
use crate::core::identifiers::BuildId;
use crate::core::identifiers::ComponentName;
use crate::core::identifiers::EnvKey;
use crate::core::identifiers::TicketId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Stages
// ============================================================================

/// Canonical environment tiers every environment name is classified into.
///
/// # Invariants
/// - Variants are stable for serialization and ordered by promotion flow
///   (`Dev < Qa < Uat < Prod`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    /// Development tier.
    Dev,
    /// Quality-assurance tier.
    Qa,
    /// User-acceptance tier.
    Uat,
    /// Production tier.
    Prod,
}

impl Stage {
    /// All stages in promotion order.
    pub const ALL: [Self; 4] = [Self::Dev, Self::Qa, Self::Uat, Self::Prod];

    /// Classifies an environment key into a canonical stage.
    ///
    /// Fixed substring rules: an environment containing `prod` is `PROD`,
    /// containing `uat` is `UAT`, containing `qa` (or exactly matching the
    /// configured QA alias, case-insensitively) is `QA`; everything else is
    /// `DEV`.
    #[must_use]
    pub fn classify(env: &EnvKey, qa_alias: Option<&str>) -> Self {
        let lowered = env.as_str().to_ascii_lowercase();
        if lowered.contains("prod") {
            return Self::Prod;
        }
        if lowered.contains("uat") {
            return Self::Uat;
        }
        if lowered.contains("qa") {
            return Self::Qa;
        }
        if let Some(alias) = qa_alias
            && lowered == alias.to_ascii_lowercase()
        {
            return Self::Qa;
        }
        Self::Dev
    }

    /// Returns the stable uppercase label for the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "DEV",
            Self::Qa => "QA",
            Self::Uat => "UAT",
            Self::Prod => "PROD",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Confidence
// ============================================================================

/// Confidence tier attached to presence evidence.
///
/// # Invariants
/// - Variants are stable for serialization and ordered weakest-first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Partial evidence only (promotion heuristic or large time gap).
    Low,
    /// Ordering consistent but non-critical metadata missing.
    Medium,
    /// Full merge, build, deploy chain present and time-consistent.
    High,
}

/// Source of presence evidence.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Derived from a concrete build plus deployment pair.
    BuildDriven,
    /// Derived from branch equality or the promotion heuristic.
    BranchFallback,
}

// ============================================================================
// SECTION: Presence Evidence
// ============================================================================

/// Evidence backing a `present = true` claim for one stage.
///
/// # Invariants
/// - `when` is the deployment instant of the most recent valid deployment
///   into the stage.
/// - Optional fields are `None` when the correlation chain lacked them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvidence {
    /// Deployment instant backing the claim.
    pub when: Timestamp,
    /// Build that produced the deployed artifact, when known.
    pub build: Option<BuildId>,
    /// Deployed artifact tag, when known.
    pub tag: Option<String>,
    /// Branch the artifact was built from, when known.
    pub branch: Option<BranchName>,
    /// Component the deployment landed on.
    pub component: ComponentName,
    /// Confidence tier for the claim.
    pub confidence: Confidence,
    /// Evidence source for the claim.
    pub source: EvidenceSource,
}

// ============================================================================
// SECTION: Stage Presence State Machine
// ============================================================================

/// Per-(ticket, stage) presence state.
///
/// # Invariants
/// - `Absent -> Present` on a new valid deployment; `Present -> Present`
///   refreshes evidence; `Present -> RolledBack` only on a detected
///   version-regression deployment; `RolledBack -> Present` on a forward
///   deployment. No terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StagePresence {
    /// No evidence the ticket ever reached the stage.
    #[default]
    Absent,
    /// The ticket reached the stage with the attached evidence.
    Present {
        /// Evidence backing the claim.
        evidence: PresenceEvidence,
    },
    /// The ticket reached the stage and was later rolled back.
    RolledBack {
        /// Evidence recorded before the rollback.
        last_evidence: PresenceEvidence,
        /// Artifact tag of the regressing deployment.
        rolled_back_by: String,
        /// Instant the rollback deployment was observed.
        rolled_back_at: Timestamp,
    },
}

impl StagePresence {
    /// Returns whether the stage currently counts as present.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Returns the current evidence, when present.
    #[must_use]
    pub const fn evidence(&self) -> Option<&PresenceEvidence> {
        match self {
            Self::Present {
                evidence,
            } => Some(evidence),
            Self::Absent
            | Self::RolledBack {
                ..
            } => None,
        }
    }
}

// ============================================================================
// SECTION: Timeline
// ============================================================================

/// One stage-transition entry in a ticket's chronological timeline.
///
/// # Invariants
/// - Entries are ordered by `at` within [`TicketPresence::timeline`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Stage the deployment landed in.
    pub stage: Stage,
    /// Deployment instant.
    pub at: Timestamp,
    /// Deployed artifact tag, when known.
    pub tag: Option<String>,
    /// Build that produced the artifact, when known.
    pub build: Option<BuildId>,
    /// Whether the entry passed time-aware validation.
    pub time_aware: bool,
}

// ============================================================================
// SECTION: Ticket Presence
// ============================================================================

/// Full presence record for one ticket across all stages.
///
/// # Invariants
/// - `stages` holds an entry per stage with evidence; missing keys mean
///   `Absent`.
/// - `timeline` is chronological and append-ordered across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPresence {
    /// Ticket identifier.
    pub ticket: TicketId,
    /// Per-stage presence states.
    pub stages: BTreeMap<Stage, StagePresence>,
    /// Chronological stage-transition timeline.
    pub timeline: Vec<TimelineEntry>,
}

impl TicketPresence {
    /// Creates an empty presence record for a ticket.
    #[must_use]
    pub const fn new(ticket: TicketId) -> Self {
        Self {
            ticket,
            stages: BTreeMap::new(),
            timeline: Vec::new(),
        }
    }

    /// Returns the presence state for a stage (`Absent` when unrecorded).
    #[must_use]
    pub fn stage(&self, stage: Stage) -> &StagePresence {
        const ABSENT: &StagePresence = &StagePresence::Absent;
        self.stages.get(&stage).unwrap_or(ABSENT)
    }

    /// Returns the stage to bool presence map consumed by reporting.
    #[must_use]
    pub fn env_presence(&self) -> BTreeMap<Stage, bool> {
        Stage::ALL
            .iter()
            .map(|stage| (*stage, self.stage(*stage).is_present()))
            .collect()
    }

    /// Returns the stage to evidence map consumed by reporting.
    ///
    /// Stages without current evidence (absent or rolled back) map to
    /// `None`.
    #[must_use]
    pub fn env_presence_meta(&self) -> BTreeMap<Stage, Option<&PresenceEvidence>> {
        Stage::ALL
            .iter()
            .map(|stage| (*stage, self.stage(*stage).evidence()))
            .collect()
    }
}
