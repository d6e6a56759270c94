// crates/release-ledger-store/tests/event_log.rs
// ============================================================================
// Module: Event Log Tests
// Description: Validate append, idempotency, and crash recovery.
// Purpose: Ensure the log honors append-only and last-complete-line
//          semantics.
// ============================================================================

//! Event log and file event store tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;

use common::event;
use release_ledger_core::EventFilter;
use release_ledger_core::EventStore;
use release_ledger_core::ProjectKey;
use release_ledger_core::StoreError;
use release_ledger_core::Timestamp;
use release_ledger_store::EventLog;
use release_ledger_store::FileEventStore;

// ============================================================================
// SECTION: Append and Read
// ============================================================================

#[test]
fn appended_events_read_back_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();

    let first = event("api", "v1.0.1", 1_000);
    let second = event("worker", "v2.0.0", 2_000);
    let appended = store.append(&[first.clone(), second.clone()]).unwrap();
    assert_eq!(appended, 2);

    let tail = store.read_tail(10).unwrap();
    assert_eq!(tail, vec![first, second]);
}

#[test]
fn append_is_idempotent_by_identifier() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();

    let entry = event("api", "v1.0.1", 1_000);
    assert_eq!(store.append(&[entry.clone()]).unwrap(), 1);
    assert_eq!(store.append(&[entry.clone()]).unwrap(), 0, "replay must not append");
    assert_eq!(store.append(&[entry.clone(), entry]).unwrap(), 0);

    let index = store.read_index().unwrap();
    assert_eq!(index.event_count, 1);
    assert_eq!(store.read_tail(10).unwrap().len(), 1);
}

#[test]
fn index_tracks_boundaries_and_projects_incrementally() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();

    store.append(&[event("api", "v1.0.1", 5_000), event("api", "v1.0.2", 2_000)]).unwrap();

    let index = store.read_index().unwrap();
    assert_eq!(index.event_count, 2);
    assert_eq!(index.oldest_at, Some(Timestamp::from_unix_millis(2_000)));
    assert_eq!(index.newest_at, Some(Timestamp::from_unix_millis(5_000)));
    let stats = index.projects.get(&ProjectKey::new("payments")).unwrap();
    assert_eq!(stats.event_count, 2);
}

#[test]
fn read_range_filters_by_time_and_project() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();
    store
        .append(&[
            event("api", "v1.0.1", 1_000),
            event("api", "v1.0.2", 5_000),
            event("api", "v1.0.3", 9_000),
        ])
        .unwrap();

    let filter = EventFilter {
        from: Some(Timestamp::from_unix_millis(2_000)),
        until: Some(Timestamp::from_unix_millis(8_000)),
        project: Some(ProjectKey::new("payments")),
    };
    let events = store.read_range(&filter).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].to_tag, "v1.0.2");

    let other_project = EventFilter {
        project: Some(ProjectKey::new("billing")),
        ..EventFilter::default()
    };
    assert!(store.read_range(&other_project).unwrap().is_empty());
}

// ============================================================================
// SECTION: Crash Recovery
// ============================================================================

#[test]
fn interrupted_append_preserves_committed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();
    let committed = event("api", "v1.0.1", 1_000);
    store.append(&[committed.clone()]).unwrap();

    // Simulate a crash mid-write: an unterminated JSON fragment at the end.
    let log_path = dir.path().join("events.ndjson");
    let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
    file.write_all(b"{\"id\":\"trunc").unwrap();
    drop(file);

    let (events, warnings) = EventLog::new(&log_path).read_all().unwrap();
    assert_eq!(events, vec![committed.clone()]);
    assert!(!warnings.is_empty(), "the skipped fragment is surfaced as a warning");

    // The next append seals the log back to its last complete line first.
    let next = event("api", "v1.0.2", 2_000);
    store.append(&[next.clone()]).unwrap();
    let tail = store.read_tail(10).unwrap();
    assert_eq!(tail, vec![committed, next]);
}

#[test]
fn corrupt_committed_line_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();
    store.append(&[event("api", "v1.0.1", 1_000)]).unwrap();

    let log_path = dir.path().join("events.ndjson");
    let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
    file.write_all(b"not json at all\n").unwrap();
    drop(file);

    let result = EventLog::new(&log_path).read_all();
    assert!(matches!(result, Err(StoreError::Corrupt(_))));
}

#[test]
fn interrupted_index_update_heals_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();
    let entry = event("api", "v1.0.1", 1_000);
    store.append(&[entry.clone()]).unwrap();

    // Simulate a crash between the log write and the index write by
    // duplicating the committed line behind the store's back.
    let log_path = dir.path().join("events.ndjson");
    let line = fs::read_to_string(&log_path).unwrap();
    let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
    file.write_all(line.as_bytes()).unwrap();
    drop(file);

    let tail = store.read_tail(10).unwrap();
    assert_eq!(tail, vec![entry], "duplicate identifiers collapse on read");
}
