// crates/release-ledger-core/src/runtime/store.rs
// ============================================================================
// Module: Release Ledger In-Memory Stores
// Description: Simple in-memory store implementations for tests and examples.
// Purpose: Provide deterministic store implementations without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides simple in-memory implementations of the store
//! interfaces for tests and local demos. They honor the same contracts as
//! the durable file stores (idempotent append, move-not-delete retention,
//! conflict-rejecting lock) but are not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::core::DeploymentEvent;
use crate::core::EventIndex;
use crate::core::Snapshot;
use crate::core::TicketId;
use crate::core::TicketPresence;
use crate::core::Timestamp;
use crate::core::Warnings;
use crate::interfaces::EventFilter;
use crate::interfaces::EventStore;
use crate::interfaces::MigrationReport;
use crate::interfaces::RetentionReport;
use crate::interfaces::RunLock;
use crate::interfaces::SnapshotStore;
use crate::interfaces::StoreError;
use crate::interfaces::TicketStateStore;

// ============================================================================
// SECTION: In-Memory Snapshot Store
// ============================================================================

/// In-memory snapshot store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemorySnapshotStore {
    /// Current and previous snapshot slots behind one mutex.
    slots: Arc<Mutex<(Option<Snapshot>, Option<Snapshot>)>>,
}

impl InMemorySnapshotStore {
    /// Creates an empty in-memory snapshot store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load_current(&self) -> Result<Option<Snapshot>, StoreError> {
        let guard = self
            .slots
            .lock()
            .map_err(|_| StoreError::Io("snapshot store mutex poisoned".to_string()))?;
        Ok(guard.0.clone())
    }

    fn load_previous(&self) -> Result<Option<Snapshot>, StoreError> {
        let guard = self
            .slots
            .lock()
            .map_err(|_| StoreError::Io("snapshot store mutex poisoned".to_string()))?;
        Ok(guard.1.clone())
    }

    fn store(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|_| StoreError::Io("snapshot store mutex poisoned".to_string()))?;
        guard.1 = guard.0.take();
        guard.0 = Some(snapshot.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: In-Memory Event Store
// ============================================================================

/// Inner state of the in-memory event store.
#[derive(Debug, Default)]
struct EventStoreState {
    /// Active log entries in append order.
    active: Vec<DeploymentEvent>,
    /// Archived entries in archival order.
    archive: Vec<DeploymentEvent>,
    /// Incremental index aggregate.
    index: EventIndex,
}

/// In-memory event store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventStore {
    /// Store state behind one mutex.
    state: Arc<Mutex<EventStoreState>>,
}

impl InMemoryEventStore {
    /// Creates an empty in-memory event store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every archived event in archival order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the store mutex is poisoned.
    pub fn read_archive(&self) -> Result<Vec<DeploymentEvent>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.archive.clone())
    }

    /// Locks the store state.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, EventStoreState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Io("event store mutex poisoned".to_string()))
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, events: &[DeploymentEvent]) -> Result<u64, StoreError> {
        let mut guard = self.lock()?;
        let mut appended = 0;
        for event in events {
            if guard.index.record_appended(event) {
                guard.active.push(event.clone());
                appended += 1;
            }
        }
        Ok(appended)
    }

    fn read_index(&self) -> Result<EventIndex, StoreError> {
        let guard = self.lock()?;
        Ok(guard.index.clone())
    }

    fn read_tail(&self, n: usize) -> Result<Vec<DeploymentEvent>, StoreError> {
        let guard = self.lock()?;
        let skip = guard.active.len().saturating_sub(n);
        Ok(guard.active.iter().skip(skip).cloned().collect())
    }

    fn read_range(&self, filter: &EventFilter) -> Result<Vec<DeploymentEvent>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.active.iter().filter(|event| filter.matches(event)).cloned().collect())
    }

    fn apply_retention(
        &self,
        cutoff_days: u32,
        now: Timestamp,
    ) -> Result<RetentionReport, StoreError> {
        let cutoff = now.saturating_sub_days(cutoff_days);
        let mut guard = self.lock()?;

        let (archived, kept): (Vec<DeploymentEvent>, Vec<DeploymentEvent>) =
            guard.active.drain(..).partition(|event| event.at < cutoff);
        let remaining = kept.len() as u64;
        let archived_count = archived.len() as u64;

        let new_oldest = kept.iter().map(|event| event.at).min();
        guard.index.record_archived(&archived, cutoff, now, new_oldest);
        guard.archive.extend(archived);
        guard.active = kept;

        Ok(RetentionReport {
            cutoff,
            archived: archived_count,
            remaining,
        })
    }

    fn migrate_legacy(&self, _now: Timestamp) -> Result<MigrationReport, StoreError> {
        let mut guard = self.lock()?;
        if guard.index.legacy_migrated {
            return Ok(MigrationReport {
                skipped: true,
                migrated: 0,
                warnings: Warnings::new(),
            });
        }
        guard.index.legacy_migrated = true;
        Ok(MigrationReport {
            skipped: false,
            migrated: 0,
            warnings: Warnings::new(),
        })
    }
}

// ============================================================================
// SECTION: In-Memory Ticket State Store
// ============================================================================

/// In-memory ticket state store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTicketStateStore {
    /// Ticket records behind one mutex.
    tickets: Arc<Mutex<BTreeMap<TicketId, TicketPresence>>>,
}

impl InMemoryTicketStateStore {
    /// Creates an empty in-memory ticket state store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TicketStateStore for InMemoryTicketStateStore {
    fn load_all(&self) -> Result<BTreeMap<TicketId, TicketPresence>, StoreError> {
        let guard = self
            .tickets
            .lock()
            .map_err(|_| StoreError::Io("ticket store mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save_all(&self, tickets: &BTreeMap<TicketId, TicketPresence>) -> Result<(), StoreError> {
        let mut guard = self
            .tickets
            .lock()
            .map_err(|_| StoreError::Io("ticket store mutex poisoned".to_string()))?;
        *guard = tickets.clone();
        Ok(())
    }
}

// ============================================================================
// SECTION: In-Memory Run Lock
// ============================================================================

/// In-memory run lock for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRunLock {
    /// Claim flag shared with outstanding guards.
    held: Arc<AtomicBool>,
}

impl InMemoryRunLock {
    /// Creates an unheld in-memory run lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Guard releasing the in-memory run lock on drop.
#[derive(Debug)]
pub struct InMemoryRunLockGuard {
    /// Claim flag cleared on drop.
    held: Arc<AtomicBool>,
}

impl Drop for InMemoryRunLockGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }
}

impl RunLock for InMemoryRunLock {
    type Guard = InMemoryRunLockGuard;

    fn acquire(&self) -> Result<Self::Guard, StoreError> {
        if self.held.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Conflict("a run is already active".to_string()));
        }
        Ok(InMemoryRunLockGuard {
            held: Arc::clone(&self.held),
        })
    }
}
