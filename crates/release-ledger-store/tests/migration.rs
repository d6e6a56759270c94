// crates/release-ledger-store/tests/migration.rs
// ============================================================================
// Module: Legacy Migration Tests
// Description: Validate one-time, idempotent legacy-document conversion.
// Purpose: Ensure the legacy document is preserved and never re-imported.
// ============================================================================

//! Legacy migration tests for the file event store.

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

use std::fs;

use release_ledger_core::EventKind;
use release_ledger_core::EventStore;
use release_ledger_core::Timestamp;
use release_ledger_store::FileEventStore;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const LEGACY_DOCUMENT: &str = r#"{
  "events": [
    {
      "kind": "DEPLOYMENT",
      "projectKey": "payments",
      "envKey": "prod",
      "component": "api",
      "repo": "acme/payments",
      "fromTag": "v0.9.0",
      "toTag": "v1.0.0",
      "deployedAt": "2024-03-01T12:00:00Z",
      "deployer": "deploy-bot",
      "tagSha": "abc123",
      "at": "2024-03-01T12:00:05Z"
    },
    {
      "kind": "TAG_CHANGE",
      "projectKey": "payments",
      "envKey": "qa1",
      "component": "api",
      "repo": "acme/payments",
      "fromTag": "v0.8.0",
      "toTag": "v0.9.0",
      "deployedAt": "not-a-timestamp",
      "at": "2024-02-01T09:00:00Z"
    },
    {
      "component": "orphan-without-keys"
    }
  ]
}"#;

fn store_with_legacy() -> (tempfile::TempDir, FileEventStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();
    fs::write(store.legacy_path(), LEGACY_DOCUMENT).unwrap();
    (dir, store)
}

fn now() -> Timestamp {
    Timestamp::from_unix_millis(1_800_000_000_000)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn migration_converts_records_and_preserves_a_backup() {
    let (_dir, store) = store_with_legacy();

    let report = store.migrate_legacy(now()).unwrap();
    assert!(!report.skipped);
    assert_eq!(report.migrated, 2);
    assert!(!report.warnings.is_empty(), "the orphan record is surfaced as a warning");

    let events = store.read_tail(10).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::Deployment);
    assert_eq!(events[0].deployer.as_deref(), Some("deploy-bot"));
    assert_eq!(events[1].kind, EventKind::TagChange);
    assert!(
        events[1].deployed_at.is_none(),
        "an unparsable legacy timestamp becomes absent, never guessed"
    );

    assert!(!store.legacy_path().exists(), "the legacy document moved to its backup");
    let backup = fs::read_to_string(
        release_ledger_store::migration::backup_path(&store.legacy_path()),
    )
    .unwrap();
    assert_eq!(backup, LEGACY_DOCUMENT, "the backup preserves the original byte-for-byte");
}

#[test]
fn migration_is_idempotent() {
    let (_dir, store) = store_with_legacy();

    let first = store.migrate_legacy(now()).unwrap();
    assert!(!first.skipped);
    assert_eq!(first.migrated, 2);

    let second = store.migrate_legacy(now()).unwrap();
    assert!(second.skipped, "a completed migration is tracked by the persisted flag");
    assert_eq!(second.migrated, 0);
    assert_eq!(store.read_index().unwrap().event_count, 2);
}

#[test]
fn migration_without_a_legacy_document_marks_the_flag() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileEventStore::open(dir.path()).unwrap();

    let first = store.migrate_legacy(now()).unwrap();
    assert!(!first.skipped);
    assert_eq!(first.migrated, 0);

    let second = store.migrate_legacy(now()).unwrap();
    assert!(second.skipped);
    assert!(store.read_index().unwrap().legacy_migrated);
}

#[test]
fn migrated_events_dedup_against_existing_log_entries() {
    let (_dir, store) = store_with_legacy();
    let first = store.migrate_legacy(now()).unwrap();
    assert_eq!(first.migrated, 2);

    // Restore the legacy document and clear the flag by hand to simulate a
    // crash after append but before the flag write.
    fs::rename(
        release_ledger_store::migration::backup_path(&store.legacy_path()),
        store.legacy_path(),
    )
    .unwrap();
    let mut index = store.read_index().unwrap();
    index.legacy_migrated = false;
    release_ledger_store::files::write_json_atomic(&store.index_path(), &index).unwrap();

    let replay = store.migrate_legacy(now()).unwrap();
    assert!(!replay.skipped);
    assert_eq!(replay.migrated, 0, "identical legacy events dedup by identifier");
    assert_eq!(store.read_index().unwrap().event_count, 2);
}
