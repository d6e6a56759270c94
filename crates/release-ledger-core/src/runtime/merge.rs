// crates/release-ledger-core/src/runtime/merge.rs
// ============================================================================
// Module: Release Ledger Persistent Merge Engine
// Description: Cross-run reconciliation of ticket presence state.
// Purpose: Enforce once-present-stays-present semantics with rollback detection.
// Dependencies: crate::core, crate::runtime::version
// ============================================================================

//! ## Overview
//! The merge engine reconciles this run's presence map with previously
//! persisted per-ticket state. Current-run evidence always wins when
//! present; absence of evidence this run retains the prior state unchanged.
//! The only transition from `present` back to not-present is an explicit
//! rollback: a deployment whose artifact tag orders strictly earlier than
//! the recorded one. Tags that do not parse under the version comparator
//! are excluded from rollback detection with a warning, never guessed at.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::Stage;
use crate::core::StagePresence;
use crate::core::TicketId;
use crate::core::TicketPresence;
use crate::core::TimelineEntry;
use crate::core::Warning;
use crate::core::WarningKind;
use crate::core::Warnings;
use crate::runtime::version::VersionOrder;
use crate::runtime::version::compare_tags;

// ============================================================================
// SECTION: Merge
// ============================================================================

/// Merges this run's presence map with the previously persisted state.
///
/// Tickets present only in the prior state are retained unchanged; tickets
/// present only in the current run enter as-is. Per-stage reconciliation
/// follows the state machine documented on [`StagePresence`].
#[must_use]
pub fn merge_presence(
    current: BTreeMap<TicketId, TicketPresence>,
    prior: BTreeMap<TicketId, TicketPresence>,
) -> (BTreeMap<TicketId, TicketPresence>, Warnings) {
    let mut warnings = Warnings::new();
    let mut merged = prior;

    for (ticket, current_record) in current {
        match merged.remove(&ticket) {
            None => {
                merged.insert(ticket, current_record);
            }
            Some(prior_record) => {
                let reconciled =
                    merge_ticket(&ticket, prior_record, current_record, &mut warnings);
                merged.insert(ticket, reconciled);
            }
        }
    }

    (merged, warnings)
}

/// Reconciles one ticket's prior and current records.
fn merge_ticket(
    ticket: &TicketId,
    prior: TicketPresence,
    current: TicketPresence,
    warnings: &mut Warnings,
) -> TicketPresence {
    let mut merged = TicketPresence {
        ticket: prior.ticket,
        stages: prior.stages,
        timeline: prior.timeline,
    };

    append_timeline(&mut merged.timeline, current.timeline);

    for (stage, incoming) in current.stages {
        let existing = merged.stages.remove(&stage).unwrap_or_default();
        let next = merge_stage(ticket, stage, existing, incoming, warnings);
        merged.stages.insert(stage, next);
    }

    merged
}

/// Applies one stage transition of the presence state machine.
fn merge_stage(
    ticket: &TicketId,
    stage: Stage,
    existing: StagePresence,
    incoming: StagePresence,
    warnings: &mut Warnings,
) -> StagePresence {
    let StagePresence::Present {
        evidence: incoming_evidence,
    } = incoming
    else {
        // The current run asserts nothing for this stage; prior state is
        // retained unchanged.
        return existing;
    };

    match existing {
        StagePresence::Absent => StagePresence::Present {
            evidence: incoming_evidence,
        },
        StagePresence::Present {
            evidence: recorded,
        } => match tag_direction(&incoming_evidence.tag, &recorded.tag) {
            TagDirection::Rollback => StagePresence::RolledBack {
                rolled_back_by: incoming_evidence.tag.clone().unwrap_or_default(),
                rolled_back_at: incoming_evidence.when,
                last_evidence: recorded,
            },
            TagDirection::Forward => StagePresence::Present {
                evidence: incoming_evidence,
            },
            TagDirection::Unknown => {
                let incoming_tag =
                    incoming_evidence.tag.clone().unwrap_or_else(|| "(untagged)".to_string());
                let recorded_tag =
                    recorded.tag.clone().unwrap_or_else(|| "(untagged)".to_string());
                warnings.push(
                    Warning::for_ticket(
                        WarningKind::UnknownVersionOrder,
                        ticket.clone(),
                        format!(
                            "tags {incoming_tag} and {recorded_tag} do not order; rollback detection skipped"
                        ),
                    )
                    .with_stage(stage),
                );
                StagePresence::Present {
                    evidence: incoming_evidence,
                }
            }
        },
        StagePresence::RolledBack {
            last_evidence, ..
        } => match tag_direction(&incoming_evidence.tag, &last_evidence.tag) {
            TagDirection::Rollback => StagePresence::RolledBack {
                rolled_back_by: incoming_evidence.tag.clone().unwrap_or_default(),
                rolled_back_at: incoming_evidence.when,
                last_evidence,
            },
            TagDirection::Forward | TagDirection::Unknown => StagePresence::Present {
                evidence: incoming_evidence,
            },
        },
    }
}

// ============================================================================
// SECTION: Tag Direction
// ============================================================================

/// Direction of an incoming deployment tag relative to the recorded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagDirection {
    /// Forward or same-version deployment.
    Forward,
    /// Version regression.
    Rollback,
    /// Direction undetermined; rollback detection skipped.
    Unknown,
}

/// Compares optional evidence tags conservatively.
///
/// A missing tag on either side means rollback cannot be detected and the
/// direction stays unknown.
fn tag_direction(incoming: &Option<String>, recorded: &Option<String>) -> TagDirection {
    match (incoming, recorded) {
        (Some(incoming), Some(recorded)) => match compare_tags(incoming, recorded) {
            VersionOrder::Forward => TagDirection::Forward,
            VersionOrder::Rollback => TagDirection::Rollback,
            VersionOrder::Unknown => TagDirection::Unknown,
        },
        _ => TagDirection::Unknown,
    }
}

// ============================================================================
// SECTION: Timeline Merge
// ============================================================================

/// Appends this run's timeline entries, skipping exact duplicates and
/// keeping chronological order.
fn append_timeline(existing: &mut Vec<TimelineEntry>, incoming: Vec<TimelineEntry>) {
    for entry in incoming {
        if !existing.contains(&entry) {
            existing.push(entry);
        }
    }
    existing.sort_by_key(|entry| entry.at);
}
