// crates/release-ledger-core/src/runtime/presence.rs
// ============================================================================
// Module: Release Ledger Confidence & Presence Engine
// Description: Build-driven environment presence with confidence tiers.
// Purpose: Aggregate time-aware deployments into per-ticket presence maps.
// Dependencies: crate::core, crate::runtime::correlator
// ============================================================================

//! ## Overview
//! Environment presence is build-driven, not branch-driven: only a
//! deployment tied to a concrete build and artifact establishes presence,
//! never branch membership alone. The branch-fallback path runs only when
//! no build-driven evidence exists for a ticket, and accepts either an
//! exact branch match or a delayed deployment inside the promotion window.
//! All accepted deployments land in the ticket timeline in chronological
//! order; the most recent valid deployment per stage is surfaced as the
//! current presence evidence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::ComponentKey;
use crate::core::Confidence;
use crate::core::EvidenceSource;
use crate::core::PresenceEvidence;
use crate::core::PullRequestFact;
use crate::core::Stage;
use crate::core::StagePresence;
use crate::core::TagChangeFact;
use crate::core::TicketId;
use crate::core::TicketPresence;
use crate::core::TimelineEntry;
use crate::core::Warning;
use crate::core::WarningKind;
use crate::core::Warnings;
use crate::runtime::correlator::CorrelationResult;
use crate::runtime::correlator::TimeAwareDeployment;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for presence computation.
///
/// # Invariants
/// - `promotion_window_hours` bounds the branch-fallback promotion
///   heuristic; deployments closer to the merge with a differing branch are
///   rejected, not downgraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceConfig {
    /// Optional exact-match alias classified as QA.
    pub qa_env_alias: Option<String>,
    /// Minimum hours between merge and deployment for the promotion
    /// heuristic to accept a branch mismatch.
    pub promotion_window_hours: u32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            qa_env_alias: None,
            promotion_window_hours: 24,
        }
    }
}

// ============================================================================
// SECTION: Presence Computation
// ============================================================================

/// Computes this run's presence map for every ticket in the correlation
/// result.
///
/// Tickets without build-driven evidence fall back to branch matching
/// against this run's tag changes, using the PRs supplied for the run.
#[must_use]
pub fn compute_presence(
    correlation: &CorrelationResult,
    pull_requests: &[PullRequestFact],
    tag_changes: &BTreeMap<ComponentKey, TagChangeFact>,
    config: &PresenceConfig,
) -> (BTreeMap<TicketId, TicketPresence>, Warnings) {
    let mut presence = BTreeMap::new();
    let mut warnings = Warnings::new();

    for (ticket, entry) in &correlation.tickets {
        let mut record = TicketPresence::new(ticket.clone());
        if entry.time_aware_deployments.is_empty() {
            apply_branch_fallback(
                &mut record,
                ticket,
                pull_requests,
                tag_changes,
                config,
                &mut warnings,
            );
        } else {
            apply_build_driven(&mut record, &entry.time_aware_deployments, config);
        }
        presence.insert(ticket.clone(), record);
    }

    (presence, warnings)
}

/// Applies build-driven deployments to a ticket record.
///
/// Deployments arrive sorted by deployment instant; iterating in order
/// leaves the most recent valid deployment per stage as the surfaced
/// evidence, while the timeline keeps every entry.
fn apply_build_driven(
    record: &mut TicketPresence,
    deployments: &[TimeAwareDeployment],
    config: &PresenceConfig,
) {
    for deployment in deployments {
        let stage = Stage::classify(&deployment.key.env, config.qa_env_alias.as_deref());
        let confidence = if deployment.branch.is_some() {
            Confidence::High
        } else {
            Confidence::Medium
        };
        let evidence = PresenceEvidence {
            when: deployment.deployed_at,
            build: Some(deployment.build_id.clone()),
            tag: Some(deployment.tag.clone()),
            branch: deployment.branch.clone(),
            component: deployment.key.component.clone(),
            confidence,
            source: EvidenceSource::BuildDriven,
        };
        record.timeline.push(TimelineEntry {
            stage,
            at: deployment.deployed_at,
            tag: Some(deployment.tag.clone()),
            build: Some(deployment.build_id.clone()),
            time_aware: true,
        });
        record.stages.insert(
            stage,
            StagePresence::Present {
                evidence,
            },
        );
    }
    record.timeline.sort_by_key(|entry| entry.at);
}

/// Applies the branch-fallback rule when build-driven evidence is absent.
///
/// Exact base-ref/deployed-branch equality yields high confidence; a
/// differing branch is accepted as a probable promotion only when the
/// deployment happened at least the promotion window after the merge, at
/// low confidence. Everything else is rejected with a structured warning.
fn apply_branch_fallback(
    record: &mut TicketPresence,
    ticket: &TicketId,
    pull_requests: &[PullRequestFact],
    tag_changes: &BTreeMap<ComponentKey, TagChangeFact>,
    config: &PresenceConfig,
    warnings: &mut Warnings,
) {
    let mut accepted: Vec<(Stage, PresenceEvidence)> = Vec::new();

    for pr in pull_requests {
        if !pr.tickets.contains(ticket) {
            continue;
        }
        let Some(merged_at) = pr.merged_at else {
            warnings.push(Warning::for_ticket(
                WarningKind::MissingEvidence,
                ticket.clone(),
                format!("fallback for {}: excluded, missing pr merge timestamp", pr.merge_sha),
            ));
            continue;
        };
        for fact in tag_changes.values() {
            if fact.repo != pr.repo {
                continue;
            }
            let Some(deployed_at) = fact.deployed_at else {
                warnings.push(Warning::for_ticket(
                    WarningKind::MissingEvidence,
                    ticket.clone(),
                    format!("fallback for {}: excluded, missing deployment timestamp", fact.key),
                ));
                continue;
            };
            if deployed_at < merged_at {
                warnings.push(Warning::for_ticket(
                    WarningKind::OrderingViolation,
                    ticket.clone(),
                    format!("fallback for {}: excluded, deployment precedes merge", fact.key),
                ));
                continue;
            }

            let stage = Stage::classify(&fact.key.env, config.qa_env_alias.as_deref());
            let exact_branch_match = match (&pr.base_ref, &fact.branch) {
                (Some(base_ref), Some(deployed_branch)) => base_ref == deployed_branch,
                _ => false,
            };
            let confidence = if exact_branch_match {
                Confidence::High
            } else if deployed_at >= merged_at.saturating_add_hours(config.promotion_window_hours)
            {
                Confidence::Low
            } else {
                warnings.push(
                    Warning::for_ticket(
                        WarningKind::FallbackRejected,
                        ticket.clone(),
                        format!(
                            "fallback for {}: branch mismatch inside promotion window",
                            fact.key
                        ),
                    )
                    .with_stage(stage),
                );
                continue;
            };

            accepted.push((
                stage,
                PresenceEvidence {
                    when: deployed_at,
                    build: None,
                    tag: Some(fact.to_tag.clone()),
                    branch: fact.branch.clone(),
                    component: fact.key.component.clone(),
                    confidence,
                    source: EvidenceSource::BranchFallback,
                },
            ));
        }
    }

    accepted.sort_by_key(|(_, evidence)| evidence.when);
    for (stage, evidence) in accepted {
        record.timeline.push(TimelineEntry {
            stage,
            at: evidence.when,
            tag: evidence.tag.clone(),
            build: None,
            time_aware: false,
        });
        record.stages.insert(
            stage,
            StagePresence::Present {
                evidence,
            },
        );
    }
}
