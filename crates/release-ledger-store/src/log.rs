// crates/release-ledger-store/src/log.rs
// ============================================================================
// Module: Append-Only Event Log
// Description: Newline-delimited JSON event log with crash recovery.
// Purpose: Persist one self-contained, independently parseable event per line.
// Dependencies: release-ledger-core, serde_json
// ============================================================================

//! ## Overview
//! Events are stored one JSON object per line and only ever appended.
//! Before each append the log seals itself against an earlier interrupted
//! write by truncating an unterminated trailing fragment back to the last
//! complete line; committed entries are never touched. Reads fail closed on
//! a terminated line that does not parse and collapse duplicate identifiers
//! left by an interrupted index update.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use release_ledger_core::DeploymentEvent;
use release_ledger_core::StoreError;
use release_ledger_core::Warning;
use release_ledger_core::WarningKind;
use release_ledger_core::Warnings;

// ============================================================================
// SECTION: Event Log
// ============================================================================

/// Append-only newline-delimited JSON event log.
#[derive(Debug, Clone)]
pub struct EventLog {
    /// Path of the active log file.
    path: PathBuf,
}

impl EventLog {
    /// Creates a log handle for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drops an unterminated trailing fragment left by an interrupted
    /// append, keeping every complete line intact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the log cannot be inspected or
    /// truncated.
    pub fn recover(&self) -> Result<(), StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };
        if bytes.is_empty() || bytes.ends_with(b"\n") {
            return Ok(());
        }
        let keep = bytes.iter().rposition(|byte| *byte == b'\n').map_or(0, |pos| pos + 1);
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        file.set_len(keep as u64).map_err(|err| StoreError::Io(err.to_string()))?;
        file.sync_all().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    /// Appends events to the end of the log, one line each.
    ///
    /// Callers own dedup; every event passed in is written. Lines are
    /// flushed and synced before returning so a crash after `append` never
    /// loses a reported write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on write failures and
    /// [`StoreError::Invalid`] when an event cannot be serialized.
    pub fn append(&self, events: &[&DeploymentEvent]) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }
        self.recover()?;
        let mut buffer = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buffer, event)
                .map_err(|err| StoreError::Invalid(err.to_string()))?;
            buffer.push(b'\n');
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        file.write_all(&buffer).map_err(|err| StoreError::Io(err.to_string()))?;
        file.sync_all().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    /// Reads every committed event in log order.
    ///
    /// A trailing unterminated fragment is skipped with a structured
    /// warning; a terminated line that does not parse is corruption and
    /// fails closed. Duplicate identifiers (possible after an interrupted
    /// index update) collapse to their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on read failures and
    /// [`StoreError::Corrupt`] when a committed line does not parse.
    pub fn read_all(&self) -> Result<(Vec<DeploymentEvent>, Warnings), StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Vec::new(), Warnings::new()));
            }
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };

        let mut events = Vec::new();
        let mut seen = BTreeSet::new();
        let mut warnings = Warnings::new();
        for segment in content.split_inclusive('\n') {
            let terminated = segment.ends_with('\n');
            let line = segment.trim_end_matches('\n');
            if line.is_empty() {
                continue;
            }
            if !terminated {
                warnings.push(Warning::new(
                    WarningKind::PartialLineSkipped,
                    "unterminated trailing log line skipped",
                ));
                continue;
            }
            let event: DeploymentEvent = serde_json::from_str(line)
                .map_err(|err| StoreError::Corrupt(format!("event line does not parse: {err}")))?;
            if seen.insert(event.id.clone()) {
                events.push(event);
            }
        }
        Ok((events, warnings))
    }

    /// Replaces the log contents atomically via a temporary sibling file.
    ///
    /// Reserved for the retention pass, which moves aged-out events to the
    /// archive; ordinary writes go through [`EventLog::append`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on write failures and
    /// [`StoreError::Invalid`] when an event cannot be serialized.
    pub fn rewrite(&self, events: &[DeploymentEvent]) -> Result<(), StoreError> {
        let mut buffer = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buffer, event)
                .map_err(|err| StoreError::Invalid(err.to_string()))?;
            buffer.push(b'\n');
        }
        let tmp_path = self.path.with_extension("tmp");
        let mut tmp = File::create(&tmp_path).map_err(|err| StoreError::Io(err.to_string()))?;
        tmp.write_all(&buffer).map_err(|err| StoreError::Io(err.to_string()))?;
        tmp.sync_all().map_err(|err| StoreError::Io(err.to_string()))?;
        drop(tmp);
        fs::rename(&tmp_path, &self.path).map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }
}
