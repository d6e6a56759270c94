// crates/release-ledger-store/src/snapshots.rs
// ============================================================================
// Module: Snapshot Store
// Description: Current and previous snapshot documents with atomic rotation.
// Purpose: Preserve exactly the two snapshots the detector consults.
// Dependencies: release-ledger-core, serde_json
// ============================================================================

//! ## Overview
//! Snapshots rotate through two fixed slots: storing a new snapshot moves
//! the prior "current" document into the "previous" slot before the new
//! current lands. Both writes are atomic; snapshots are immutable once
//! stored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use release_ledger_core::Snapshot;
use release_ledger_core::SnapshotStore;
use release_ledger_core::StoreError;

use crate::files::read_json_opt;
use crate::files::write_json_atomic;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the current snapshot slot.
const CURRENT_FILE: &str = "snapshot-current.json";
/// File name of the previous snapshot slot.
const PREVIOUS_FILE: &str = "snapshot-previous.json";

// ============================================================================
// SECTION: File Snapshot Store
// ============================================================================

/// Snapshot store backed by two rotating JSON documents.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    /// Directory holding both snapshot slots.
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Creates a snapshot store rooted at the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
        }
    }

    /// Returns the path of the current snapshot slot.
    #[must_use]
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(CURRENT_FILE)
    }

    /// Returns the path of the previous snapshot slot.
    #[must_use]
    pub fn previous_path(&self) -> PathBuf {
        self.dir.join(PREVIOUS_FILE)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load_current(&self) -> Result<Option<Snapshot>, StoreError> {
        read_json_opt(&self.current_path())
    }

    fn load_previous(&self) -> Result<Option<Snapshot>, StoreError> {
        read_json_opt(&self.previous_path())
    }

    fn store(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let current = self.current_path();
        if current.exists() {
            rotate(&current, &self.previous_path())?;
        }
        write_json_atomic(&current, snapshot)
    }
}

/// Moves the current slot into the previous slot.
fn rotate(current: &Path, previous: &Path) -> Result<(), StoreError> {
    fs::rename(current, previous).map_err(|err| StoreError::Io(err.to_string()))
}
