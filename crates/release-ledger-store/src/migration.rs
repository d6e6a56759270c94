// crates/release-ledger-store/src/migration.rs
// ============================================================================
// Module: Legacy Migration
// Description: One-time conversion of the legacy monolithic event document.
// Purpose: Convert legacy records into append-only events, preserving the
//          original document as a backup.
// Dependencies: release-ledger-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Earlier deployments of this system kept every event in one monolithic
//! JSON document with camel-cased, loosely populated fields. Migration
//! converts each record into a typed, content-addressed event; records
//! missing required fields are skipped with a structured warning rather
//! than invented. The legacy document is renamed to a backup, never
//! destroyed, and a persisted index flag makes the whole pass idempotent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use release_ledger_core::DeploymentEvent;
use release_ledger_core::EventDraft;
use release_ledger_core::EventKind;
use release_ledger_core::StoreError;
use release_ledger_core::Timestamp;
use release_ledger_core::Warning;
use release_ledger_core::WarningKind;
use release_ledger_core::Warnings;
use serde::Deserialize;

// ============================================================================
// SECTION: Legacy Document Shapes
// ============================================================================

/// Legacy monolithic event document.
#[derive(Debug, Deserialize)]
pub struct LegacyDocument {
    /// Legacy event records in document order.
    #[serde(default)]
    pub events: Vec<LegacyEvent>,
}

/// One loosely typed legacy event record.
///
/// Every field is optional on the wire; conversion decides what is
/// required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEvent {
    /// Event kind tag (`DEPLOYMENT` or `TAG_CHANGE`).
    #[serde(default)]
    pub kind: Option<String>,
    /// Project key.
    #[serde(default)]
    pub project_key: Option<String>,
    /// Environment key.
    #[serde(default)]
    pub env_key: Option<String>,
    /// Component name.
    #[serde(default)]
    pub component: Option<String>,
    /// Source repository.
    #[serde(default)]
    pub repo: Option<String>,
    /// Tag before the change.
    #[serde(default)]
    pub from_tag: Option<String>,
    /// Tag after the change.
    #[serde(default)]
    pub to_tag: Option<String>,
    /// Deployment instant, RFC 3339.
    #[serde(default)]
    pub deployed_at: Option<String>,
    /// Deploying actor.
    #[serde(default)]
    pub deployer: Option<String>,
    /// SHA the tag points at.
    #[serde(default)]
    pub tag_sha: Option<String>,
    /// Record instant, RFC 3339.
    #[serde(default)]
    pub at: Option<String>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads the legacy document, returning `None` when the file is absent.
///
/// # Errors
///
/// Returns [`StoreError::Io`] on read failures and
/// [`StoreError::Corrupt`] when the document does not parse.
pub fn load_legacy(path: &Path) -> Result<Option<LegacyDocument>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::Io(err.to_string())),
    };
    let document =
        serde_json::from_slice(&bytes).map_err(|err| StoreError::Corrupt(err.to_string()))?;
    Ok(Some(document))
}

/// Renames the legacy document to its backup path.
///
/// # Errors
///
/// Returns [`StoreError::Io`] when the rename fails.
pub fn back_up_legacy(path: &Path) -> Result<(), StoreError> {
    let backup = backup_path(path);
    fs::rename(path, &backup).map_err(|err| StoreError::Io(err.to_string()))
}

/// Returns the backup path for a legacy document.
#[must_use]
pub fn backup_path(path: &Path) -> std::path::PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    std::path::PathBuf::from(backup)
}

// ============================================================================
// SECTION: Conversion
// ============================================================================

/// Converts legacy records into typed events.
///
/// Records missing a project key, environment key, component, repo, or new
/// tag are skipped with a warning. Timestamps that do not parse as RFC 3339
/// become absent rather than guessed; the record instant falls back to
/// `now`.
#[must_use]
pub fn convert_legacy(
    document: &LegacyDocument,
    now: Timestamp,
) -> (Vec<DeploymentEvent>, Warnings) {
    let mut events = Vec::new();
    let mut warnings = Warnings::new();

    for (position, record) in document.events.iter().enumerate() {
        match convert_record(record, now) {
            Ok(event) => events.push(event),
            Err(missing) => {
                warnings.push(Warning::new(
                    WarningKind::MissingEvidence,
                    format!("legacy event {position} skipped: missing {missing}"),
                ));
            }
        }
    }

    (events, warnings)
}

/// Converts one legacy record, naming the first missing required field.
fn convert_record(record: &LegacyEvent, now: Timestamp) -> Result<DeploymentEvent, &'static str> {
    let project_key = required(&record.project_key, "projectKey")?;
    let env_key = required(&record.env_key, "envKey")?;
    let component = required(&record.component, "component")?;
    let repo = required(&record.repo, "repo")?;
    let to_tag = required(&record.to_tag, "toTag")?;

    let kind = match record.kind.as_deref() {
        Some("DEPLOYMENT") => EventKind::Deployment,
        _ => EventKind::TagChange,
    };
    let deployed_at = record.deployed_at.as_deref().and_then(Timestamp::parse_rfc3339);
    let at = record.at.as_deref().and_then(Timestamp::parse_rfc3339).unwrap_or(now);

    let draft = EventDraft {
        kind,
        project_key: project_key.into(),
        env_key: env_key.into(),
        component: component.into(),
        repo: repo.into(),
        from_tag: record.from_tag.clone().unwrap_or_default(),
        to_tag: to_tag.to_string(),
        deployed_at,
        deployer: record.deployer.clone(),
        tag_sha: record.tag_sha.clone().map(Into::into),
    };
    DeploymentEvent::derive(draft, at).map_err(|_| "canonical form")
}

/// Returns a required field or its name as the error.
fn required<'a>(
    field: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, &'static str> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(name),
    }
}
