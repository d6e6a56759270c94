// crates/release-ledger-core/src/core/index.rs
// ============================================================================
// Module: Release Ledger Event Index
// Description: Lightweight aggregate over the append-only event log.
// Purpose: Answer count/boundary queries without rescanning the log.
// Dependencies: crate::core::{events, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! The index is a compact aggregate maintained incrementally: only newly
//! appended or newly archived events touch it, and the full log is never
//! rescanned on a normal run. `known_ids` covers the active log only and is
//! the dedup window for idempotent append; retention prunes identifiers it
//! moves to the archive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::events::DeploymentEvent;
use crate::core::events::EventId;
use crate::core::identifiers::ProjectKey;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Per-Project Stats
// ============================================================================

/// Aggregate counters for one project.
///
/// # Invariants
/// - `event_count` counts active-log events only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectStats {
    /// Number of active-log events for the project.
    pub event_count: u64,
    /// Newest event instant for the project, when any.
    pub newest_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Retention Bookkeeping
// ============================================================================

/// Retention bookkeeping carried by the index.
///
/// # Invariants
/// - `archived_count` only grows; archived events are moved, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RetentionState {
    /// Cutoff applied by the most recent retention pass, when any.
    pub cutoff: Option<Timestamp>,
    /// Instant of the most recent retention pass, when any.
    pub last_cleanup_at: Option<Timestamp>,
    /// Total number of events moved to the archive partition.
    pub archived_count: u64,
}

// ============================================================================
// SECTION: Event Index
// ============================================================================

/// Lightweight aggregate over the event log.
///
/// # Invariants
/// - Updated incrementally on append and retention; never rebuilt by
///   rescanning the log on a normal run.
/// - `known_ids` mirrors the identifiers present in the active log exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventIndex {
    /// Number of events in the active log.
    pub event_count: u64,
    /// Oldest active-log event instant, when any.
    pub oldest_at: Option<Timestamp>,
    /// Newest active-log event instant, when any.
    pub newest_at: Option<Timestamp>,
    /// Per-project aggregate counters.
    pub projects: BTreeMap<ProjectKey, ProjectStats>,
    /// Identifiers present in the active log (idempotent-append window).
    pub known_ids: BTreeSet<EventId>,
    /// Retention bookkeeping.
    pub retention: RetentionState,
    /// Whether the one-time legacy migration has been performed.
    pub legacy_migrated: bool,
}

impl EventIndex {
    /// Returns whether the event identifier is already present in the
    /// active log.
    #[must_use]
    pub fn contains(&self, id: &EventId) -> bool {
        self.known_ids.contains(id)
    }

    /// Records one appended event into the aggregates.
    ///
    /// Returns `false` without mutating anything when the identifier is
    /// already known (idempotent append).
    pub fn record_appended(&mut self, event: &DeploymentEvent) -> bool {
        if !self.known_ids.insert(event.id.clone()) {
            return false;
        }
        self.event_count += 1;
        if self.oldest_at.is_none_or(|oldest| event.at < oldest) {
            self.oldest_at = Some(event.at);
        }
        if self.newest_at.is_none_or(|newest| event.at > newest) {
            self.newest_at = Some(event.at);
        }
        let stats = self.projects.entry(event.project_key.clone()).or_default();
        stats.event_count += 1;
        if stats.newest_at.is_none_or(|newest| event.at > newest) {
            stats.newest_at = Some(event.at);
        }
        true
    }

    /// Records a retention pass that moved the given events to the archive.
    ///
    /// `new_oldest` is the oldest instant remaining in the active log after
    /// the pass (or `None` when the log drained completely).
    pub fn record_archived(
        &mut self,
        archived: &[DeploymentEvent],
        cutoff: Timestamp,
        cleaned_at: Timestamp,
        new_oldest: Option<Timestamp>,
    ) {
        for event in archived {
            if self.known_ids.remove(&event.id) {
                self.event_count = self.event_count.saturating_sub(1);
                if let Some(stats) = self.projects.get_mut(&event.project_key) {
                    stats.event_count = stats.event_count.saturating_sub(1);
                }
            }
        }
        self.retention.archived_count += archived.len() as u64;
        self.retention.cutoff = Some(cutoff);
        self.retention.last_cleanup_at = Some(cleaned_at);
        self.oldest_at = new_oldest;
        if self.event_count == 0 {
            self.newest_at = None;
        }
    }
}
