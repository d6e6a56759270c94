// crates/release-ledger-core/src/interfaces/mod.rs
// ============================================================================
// Module: Release Ledger Interfaces
// Description: Backend-agnostic interfaces for snapshots, events, and ticket state.
// Purpose: Define the contract surfaces used by the run engine.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the run engine integrates with durable storage
//! without embedding backend-specific details. Implementations must be
//! deterministic and fail closed on missing or invalid data: a load that
//! cannot be verified is an error, never a silently empty result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::DeploymentEvent;
use crate::core::EventIndex;
use crate::core::ProjectKey;
use crate::core::Snapshot;
use crate::core::TicketId;
use crate::core::TicketPresence;
use crate::core::Timestamp;
use crate::core::Warnings;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Durable store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Any `Io` or `Corrupt` error is run-fatal for the caller; the engine
///   must not commit merge state after one.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Another run already holds the run lock.
    #[error("run conflict: {0}")]
    Conflict(String),
    /// Store data is invalid.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Event Filters
// ============================================================================

/// Filter for ranged event reads.
///
/// # Invariants
/// - `None` bounds are open; both bounds are inclusive when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventFilter {
    /// Earliest event instant to include.
    pub from: Option<Timestamp>,
    /// Latest event instant to include.
    pub until: Option<Timestamp>,
    /// Restrict to one project, when set.
    pub project: Option<ProjectKey>,
}

impl EventFilter {
    /// Returns whether an event passes the filter.
    #[must_use]
    pub fn matches(&self, event: &DeploymentEvent) -> bool {
        if let Some(from) = self.from
            && event.at < from
        {
            return false;
        }
        if let Some(until) = self.until
            && event.at > until
        {
            return false;
        }
        if let Some(project) = &self.project
            && event.project_key != *project
        {
            return false;
        }
        true
    }
}

// ============================================================================
// SECTION: Retention Report
// ============================================================================

/// Outcome of one retention pass.
///
/// # Invariants
/// - `archived` events were moved to the archive partition, never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionReport {
    /// Cutoff instant applied by the pass.
    pub cutoff: Timestamp,
    /// Number of events moved to the archive partition.
    pub archived: u64,
    /// Number of events remaining in the active log.
    pub remaining: u64,
}

// ============================================================================
// SECTION: Migration Report
// ============================================================================

/// Outcome of the one-time legacy migration.
///
/// # Invariants
/// - `skipped = true` means the migration had already been performed and
///   nothing was touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Whether the migration was skipped as already performed.
    pub skipped: bool,
    /// Number of legacy events converted into the log.
    pub migrated: u64,
    /// Structured warnings raised during conversion.
    pub warnings: Warnings,
}

// ============================================================================
// SECTION: Snapshot Store
// ============================================================================

/// Point-in-time snapshot persistence.
///
/// Storing a new snapshot rotates the prior "current" snapshot into the
/// "previous" slot; snapshots are immutable once stored.
pub trait SnapshotStore {
    /// Loads the current snapshot, when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_current(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Loads the immediately previous snapshot, when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_previous(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Stores a new snapshot, rotating current to previous.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persisting fails.
    fn store(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Event Store
// ============================================================================

/// Append-only durable event log with index, retention, and migration.
pub trait EventStore {
    /// Appends new, previously unseen events to the log.
    ///
    /// Appending an event whose identifier is already stored is a no-op for
    /// that event (idempotent append). Returns the number of events
    /// actually appended.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append cannot be completed; the log
    /// must be left at its last complete entry.
    fn append(&self, events: &[DeploymentEvent]) -> Result<u64, StoreError>;

    /// Reads the current index aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the index cannot be read.
    fn read_index(&self) -> Result<EventIndex, StoreError>;

    /// Reads the `n` most recent events in log order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the log cannot be read.
    fn read_tail(&self, n: usize) -> Result<Vec<DeploymentEvent>, StoreError>;

    /// Reads events matching the filter, in log order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the log cannot be read.
    fn read_range(&self, filter: &EventFilter) -> Result<Vec<DeploymentEvent>, StoreError>;

    /// Moves events older than the horizon into the archive partition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the pass cannot complete; a failed pass
    /// must leave the active log and archive unchanged.
    fn apply_retention(&self, cutoff_days: u32, now: Timestamp)
    -> Result<RetentionReport, StoreError>;

    /// Performs the one-time legacy-document migration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when conversion fails; the legacy document is
    /// preserved as a backup in every outcome.
    fn migrate_legacy(&self, now: Timestamp) -> Result<MigrationReport, StoreError>;
}

// ============================================================================
// SECTION: Ticket State Store
// ============================================================================

/// Persisted per-ticket presence state.
pub trait TicketStateStore {
    /// Loads all persisted ticket presence records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_all(&self) -> Result<BTreeMap<TicketId, TicketPresence>, StoreError>;

    /// Persists the merged ticket presence records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persisting fails; a failed save must
    /// leave the prior persisted state intact.
    fn save_all(&self, tickets: &BTreeMap<TicketId, TicketPresence>) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Run Lock
// ============================================================================

/// Cross-run exclusivity guard.
///
/// At most one run may be active at a time; acquiring the lock while held
/// fails with [`StoreError::Conflict`] and touches no state.
pub trait RunLock {
    /// Guard type released on drop.
    type Guard;

    /// Acquires the run lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when another run is active.
    fn acquire(&self) -> Result<Self::Guard, StoreError>;
}
