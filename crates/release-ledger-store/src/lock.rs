// crates/release-ledger-store/src/lock.rs
// ============================================================================
// Module: Run Lock
// Description: Cross-process run exclusivity via an in-memory flag and a
//              lock file.
// Purpose: Guarantee at most one active run touches the shared stores.
// Dependencies: release-ledger-core
// ============================================================================

//! ## Overview
//! A run first claims an in-process flag, then creates the lock file with
//! create-new semantics so a second process is rejected as well. Both are
//! released when the guard drops. A conflicting acquisition fails
//! immediately and touches no state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use release_ledger_core::RunLock;
use release_ledger_core::StoreError;

// ============================================================================
// SECTION: File Run Lock
// ============================================================================

/// Run lock backed by an in-process flag plus a lock file.
#[derive(Debug, Clone)]
pub struct FileRunLock {
    /// Lock file path.
    path: PathBuf,
    /// In-process claim flag.
    held: Arc<AtomicBool>,
}

impl FileRunLock {
    /// Creates a lock handle for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            held: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunLock for FileRunLock {
    type Guard = RunLockGuard;

    fn acquire(&self) -> Result<Self::Guard, StoreError> {
        if self.held.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Conflict("a run is already active in this process".to_string()));
        }
        let file = OpenOptions::new().write(true).create_new(true).open(&self.path);
        match file {
            Ok(_) => Ok(RunLockGuard {
                path: self.path.clone(),
                held: Arc::clone(&self.held),
            }),
            Err(err) => {
                self.held.store(false, Ordering::SeqCst);
                if err.kind() == std::io::ErrorKind::AlreadyExists {
                    Err(StoreError::Conflict(format!(
                        "lock file {} exists; another run is active",
                        self.path.display()
                    )))
                } else {
                    Err(StoreError::Io(err.to_string()))
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Guard releasing the run lock on drop.
#[derive(Debug)]
pub struct RunLockGuard {
    /// Lock file path removed on drop.
    path: PathBuf,
    /// In-process claim flag cleared on drop.
    held: Arc<AtomicBool>,
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        // Removal failure leaves a stale lock file for the operator to
        // clear; the in-process flag is released regardless.
        let _ = fs::remove_file(&self.path);
        self.held.store(false, Ordering::SeqCst);
    }
}
