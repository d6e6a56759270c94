// crates/release-ledger-store/src/store.rs
// ============================================================================
// Module: File Event Store
// Description: Durable EventStore and TicketStateStore over the NDJSON log.
// Purpose: Wire the log, index, retention, and migration behind core traits.
// Dependencies: release-ledger-core, serde_json
// ============================================================================

//! ## Overview
//! The file event store keeps an append-only NDJSON log, a compact JSON
//! index updated incrementally, an archive partition for retained-but-aged
//! events, and the legacy-document migration flag. Appends dedup against
//! the index's known identifiers so replayed runs cannot duplicate history.
//! Ticket presence is a separate atomically written document so a failed
//! run never tears the merged state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use release_ledger_core::DeploymentEvent;
use release_ledger_core::EventFilter;
use release_ledger_core::EventIndex;
use release_ledger_core::EventStore;
use release_ledger_core::MigrationReport;
use release_ledger_core::RetentionReport;
use release_ledger_core::StoreError;
use release_ledger_core::TicketId;
use release_ledger_core::TicketPresence;
use release_ledger_core::TicketStateStore;
use release_ledger_core::Timestamp;
use release_ledger_core::Warnings;

use crate::files::read_json_opt;
use crate::files::write_json_atomic;
use crate::log::EventLog;
use crate::migration::back_up_legacy;
use crate::migration::convert_legacy;
use crate::migration::load_legacy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the active event log.
const EVENTS_FILE: &str = "events.ndjson";
/// File name of the index document.
const INDEX_FILE: &str = "index.json";
/// File name of the persisted ticket state document.
const TICKETS_FILE: &str = "tickets.json";
/// File name of the legacy monolithic document.
const LEGACY_FILE: &str = "legacy-events.json";
/// Directory name of the archive partition.
const ARCHIVE_DIR: &str = "archive";

// ============================================================================
// SECTION: File Event Store
// ============================================================================

/// Durable event store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileEventStore {
    /// Store root directory.
    root: PathBuf,
    /// Active append-only log.
    log: EventLog,
}

impl FileEventStore {
    /// Opens (and lays out) the store under the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory layout cannot be
    /// created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| StoreError::Io(err.to_string()))?;
        fs::create_dir_all(root.join(ARCHIVE_DIR))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let log = EventLog::new(root.join(EVENTS_FILE));
        Ok(Self {
            root,
            log,
        })
    }

    /// Returns the store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the index document path.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Returns the legacy document path.
    #[must_use]
    pub fn legacy_path(&self) -> PathBuf {
        self.root.join(LEGACY_FILE)
    }

    /// Returns the archive log path for a retention cutoff.
    #[must_use]
    pub fn archive_path(&self, cutoff: Timestamp) -> PathBuf {
        self.root.join(ARCHIVE_DIR).join(format!("events-{}.ndjson", cutoff.as_unix_millis()))
    }

    /// Reads every archived event across all archive partitions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when an archive partition cannot be read.
    pub fn read_archive(&self) -> Result<Vec<DeploymentEvent>, StoreError> {
        let archive_dir = self.root.join(ARCHIVE_DIR);
        let mut paths = Vec::new();
        let entries =
            fs::read_dir(&archive_dir).map_err(|err| StoreError::Io(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::Io(err.to_string()))?;
            paths.push(entry.path());
        }
        paths.sort();

        let mut events = Vec::new();
        for path in paths {
            let (mut partition, _warnings) = EventLog::new(path).read_all()?;
            events.append(&mut partition);
        }
        Ok(events)
    }

    /// Loads the index document, starting empty when absent.
    fn load_index(&self) -> Result<EventIndex, StoreError> {
        Ok(read_json_opt(&self.index_path())?.unwrap_or_default())
    }

    /// Persists the index document atomically.
    fn save_index(&self, index: &EventIndex) -> Result<(), StoreError> {
        write_json_atomic(&self.index_path(), index)
    }

    /// Appends events through a caller-held index, returning the number
    /// actually written.
    fn append_with_index(
        &self,
        index: &mut EventIndex,
        events: &[DeploymentEvent],
    ) -> Result<u64, StoreError> {
        let mut fresh: Vec<&DeploymentEvent> = Vec::new();
        for event in events {
            if index.record_appended(event) {
                fresh.push(event);
            }
        }
        if fresh.is_empty() {
            return Ok(0);
        }
        // Log lines land before the index; an interruption between the two
        // is healed on read, where duplicate identifiers collapse.
        self.log.append(&fresh)?;
        self.save_index(index)?;
        Ok(fresh.len() as u64)
    }
}

impl EventStore for FileEventStore {
    fn append(&self, events: &[DeploymentEvent]) -> Result<u64, StoreError> {
        let mut index = self.load_index()?;
        self.append_with_index(&mut index, events)
    }

    fn read_index(&self) -> Result<EventIndex, StoreError> {
        self.load_index()
    }

    fn read_tail(&self, n: usize) -> Result<Vec<DeploymentEvent>, StoreError> {
        let (events, _warnings) = self.log.read_all()?;
        let skip = events.len().saturating_sub(n);
        Ok(events.into_iter().skip(skip).collect())
    }

    fn read_range(&self, filter: &EventFilter) -> Result<Vec<DeploymentEvent>, StoreError> {
        let (events, _warnings) = self.log.read_all()?;
        Ok(events.into_iter().filter(|event| filter.matches(event)).collect())
    }

    fn apply_retention(
        &self,
        cutoff_days: u32,
        now: Timestamp,
    ) -> Result<RetentionReport, StoreError> {
        let cutoff = now.saturating_sub_days(cutoff_days);
        let (events, _warnings) = self.log.read_all()?;
        let mut index = self.load_index()?;

        let (archived, kept): (Vec<DeploymentEvent>, Vec<DeploymentEvent>) =
            events.into_iter().partition(|event| event.at < cutoff);
        let remaining = kept.len() as u64;

        if archived.is_empty() {
            index.retention.cutoff = Some(cutoff);
            index.retention.last_cleanup_at = Some(now);
            self.save_index(&index)?;
            return Ok(RetentionReport {
                cutoff,
                archived: 0,
                remaining,
            });
        }

        // Move, never delete: archive lines land first, then the active log
        // shrinks atomically, then the index learns the new boundary. A
        // crash between the steps can only duplicate events into the
        // archive, never lose them.
        let archive = EventLog::new(self.archive_path(cutoff));
        let archive_refs: Vec<&DeploymentEvent> = archived.iter().collect();
        archive.append(&archive_refs)?;
        self.log.rewrite(&kept)?;

        let new_oldest = kept.iter().map(|event| event.at).min();
        let archived_count = archived.len() as u64;
        index.record_archived(&archived, cutoff, now, new_oldest);
        self.save_index(&index)?;

        Ok(RetentionReport {
            cutoff,
            archived: archived_count,
            remaining,
        })
    }

    fn migrate_legacy(&self, now: Timestamp) -> Result<MigrationReport, StoreError> {
        let mut index = self.load_index()?;
        if index.legacy_migrated {
            return Ok(MigrationReport {
                skipped: true,
                migrated: 0,
                warnings: Warnings::new(),
            });
        }

        let legacy_path = self.legacy_path();
        let Some(document) = load_legacy(&legacy_path)? else {
            index.legacy_migrated = true;
            self.save_index(&index)?;
            return Ok(MigrationReport {
                skipped: false,
                migrated: 0,
                warnings: Warnings::new(),
            });
        };

        let (events, warnings) = convert_legacy(&document, now);
        let migrated = self.append_with_index(&mut index, &events)?;

        // The original document survives as a backup before the flag makes
        // the migration permanent; replaying after a crash dedups cleanly.
        back_up_legacy(&legacy_path)?;
        index.legacy_migrated = true;
        self.save_index(&index)?;

        Ok(MigrationReport {
            skipped: false,
            migrated,
            warnings,
        })
    }
}

// ============================================================================
// SECTION: File Ticket State Store
// ============================================================================

/// Ticket presence persistence backed by one atomic JSON document.
#[derive(Debug, Clone)]
pub struct FileTicketStateStore {
    /// Document path.
    path: PathBuf,
}

impl FileTicketStateStore {
    /// Creates a ticket state store rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            path: root.into().join(TICKETS_FILE),
        }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TicketStateStore for FileTicketStateStore {
    fn load_all(&self) -> Result<BTreeMap<TicketId, TicketPresence>, StoreError> {
        Ok(read_json_opt(&self.path)?.unwrap_or_default())
    }

    fn save_all(&self, tickets: &BTreeMap<TicketId, TicketPresence>) -> Result<(), StoreError> {
        write_json_atomic(&self.path, tickets)
    }
}
