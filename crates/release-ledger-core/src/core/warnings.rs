// crates/release-ledger-core/src/core/warnings.rs
// ============================================================================
// Module: Release Ledger Structured Warnings
// Description: Structured exclusion and degradation records for a run.
// Purpose: Surface every fail-closed exclusion to callers, not just to logs.
// Dependencies: crate::core::{identifiers, presence}, serde
// ============================================================================

//! ## Overview
//! Every exclusion or degradation the pipeline makes is recorded as a
//! structured warning and returned alongside the run result, so the boundary
//! layer can decide to fail the whole snapshot or proceed with partial data.
//! Warnings are data, never only a log line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TicketId;
use crate::core::presence::Stage;

// ============================================================================
// SECTION: Warning Kinds
// ============================================================================

/// Stable classification of pipeline warnings.
///
/// # Invariants
/// - Variants are stable for serialization and programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A required timestamp or field was absent; the candidate was excluded.
    MissingEvidence,
    /// A later-stage timestamp preceded an earlier-stage one.
    OrderingViolation,
    /// First run: no previous snapshot, so no facts were derived.
    FirstRun,
    /// A tag did not parse under the version comparator; rollback detection
    /// skipped it.
    UnknownVersionOrder,
    /// Branch-fallback evidence was rejected (branch mismatch inside the
    /// promotion window).
    FallbackRejected,
    /// A trailing partial log line was ignored during recovery.
    PartialLineSkipped,
}

impl WarningKind {
    /// Returns a stable label for the warning kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingEvidence => "missing_evidence",
            Self::OrderingViolation => "ordering_violation",
            Self::FirstRun => "first_run",
            Self::UnknownVersionOrder => "unknown_version_order",
            Self::FallbackRejected => "fallback_rejected",
            Self::PartialLineSkipped => "partial_line_skipped",
        }
    }
}

// ============================================================================
// SECTION: Warning Records
// ============================================================================

/// One structured warning emitted by the pipeline.
///
/// # Invariants
/// - `ticket` and `stage` are populated when the warning is scoped to a
///   specific correlation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Warning classification.
    pub kind: WarningKind,
    /// Human-readable description of the exclusion or degradation.
    pub message: String,
    /// Ticket the warning is scoped to, when applicable.
    pub ticket: Option<TicketId>,
    /// Stage the warning is scoped to, when applicable.
    pub stage: Option<Stage>,
}

impl Warning {
    /// Creates an unscoped warning.
    #[must_use]
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            ticket: None,
            stage: None,
        }
    }

    /// Creates a warning scoped to a ticket.
    #[must_use]
    pub fn for_ticket(kind: WarningKind, ticket: TicketId, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            ticket: Some(ticket),
            stage: None,
        }
    }

    /// Attaches a stage scope to the warning.
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }
}

// ============================================================================
// SECTION: Warning Collection
// ============================================================================

/// Aggregate warnings collection for one run.
///
/// # Invariants
/// - Append-only within a run; ordering reflects pipeline execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Warnings {
    /// Collected warnings in emission order.
    entries: Vec<Warning>,
}

impl Warnings {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends one warning.
    pub fn push(&mut self, warning: Warning) {
        self.entries.push(warning);
    }

    /// Absorbs another collection, preserving order.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Returns the collected warnings.
    #[must_use]
    pub fn entries(&self) -> &[Warning] {
        &self.entries
    }

    /// Returns whether any warning was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of collected warnings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether a warning of the given kind was collected.
    #[must_use]
    pub fn contains_kind(&self, kind: WarningKind) -> bool {
        self.entries.iter().any(|warning| warning.kind == kind)
    }
}
