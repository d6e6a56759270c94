// crates/release-ledger-store/src/lib.rs
// ============================================================================
// Module: Release Ledger Store Library
// Description: File-backed durable stores for the run engine.
// Purpose: Expose the event log, snapshot rotation, ticket state, and lock.
// Dependencies: release-ledger-core, serde, serde_json
// ============================================================================

//! ## Overview
//! `release-ledger-store` implements the core store interfaces over plain
//! files: an append-only newline-delimited event log with a compact index,
//! an archive partition for retention, atomic snapshot and ticket-state
//! documents, and a cross-process run lock. All loads fail closed on
//! corruption; all document writes are atomic.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod files;
pub mod lock;
pub mod log;
pub mod migration;
pub mod snapshots;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use lock::FileRunLock;
pub use lock::RunLockGuard;
pub use log::EventLog;
pub use migration::LegacyDocument;
pub use migration::LegacyEvent;
pub use snapshots::FileSnapshotStore;
pub use store::FileEventStore;
pub use store::FileTicketStateStore;

// ============================================================================
// SECTION: Composition
// ============================================================================

use std::path::PathBuf;

use release_ledger_core::StoreError;

/// All file-backed stores rooted at one directory.
///
/// # Invariants
/// - Every store shares the same root, so one directory is the complete
///   persisted state layout.
#[derive(Debug, Clone)]
pub struct FileStores {
    /// Snapshot rotation store.
    pub snapshots: FileSnapshotStore,
    /// Append-only event store.
    pub events: FileEventStore,
    /// Ticket presence store.
    pub tickets: FileTicketStateStore,
    /// Cross-process run lock.
    pub lock: FileRunLock,
}

impl FileStores {
    /// Opens all stores under one root directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory layout cannot be
    /// created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let events = FileEventStore::open(&root)?;
        Ok(Self {
            snapshots: FileSnapshotStore::new(&root),
            tickets: FileTicketStateStore::new(&root),
            lock: FileRunLock::new(root.join("run.lock")),
            events,
        })
    }
}
