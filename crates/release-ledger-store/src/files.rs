// crates/release-ledger-store/src/files.rs
// ============================================================================
// Module: Store File Helpers
// Description: Atomic JSON document reads and writes with error mapping.
// Purpose: Keep every document write crash-safe via temp-file rename.
// Dependencies: release-ledger-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Document-shaped state (index, ticket state, snapshots) is written by
//! serializing to a sibling temporary file, syncing it, and renaming it over
//! the target. A crash mid-write leaves the prior document intact; readers
//! never observe a torn file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use release_ledger_core::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;

// ============================================================================
// SECTION: Atomic Document I/O
// ============================================================================

/// Writes a JSON document atomically via a temporary sibling file.
///
/// # Errors
///
/// Returns [`StoreError::Io`] when writing fails and
/// [`StoreError::Invalid`] when serialization fails.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|err| StoreError::Invalid(err.to_string()))?;
    let tmp_path = path.with_extension("tmp");
    let mut tmp = File::create(&tmp_path).map_err(|err| StoreError::Io(err.to_string()))?;
    tmp.write_all(&bytes).map_err(|err| StoreError::Io(err.to_string()))?;
    tmp.sync_all().map_err(|err| StoreError::Io(err.to_string()))?;
    drop(tmp);
    fs::rename(&tmp_path, path).map_err(|err| StoreError::Io(err.to_string()))?;
    Ok(())
}

/// Reads a JSON document, returning `None` when the file does not exist.
///
/// # Errors
///
/// Returns [`StoreError::Io`] when reading fails and
/// [`StoreError::Corrupt`] when the document does not parse.
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::Io(err.to_string())),
    };
    let value =
        serde_json::from_slice(&bytes).map_err(|err| StoreError::Corrupt(err.to_string()))?;
    Ok(Some(value))
}
