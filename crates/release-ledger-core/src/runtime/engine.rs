// crates/release-ledger-core/src/runtime/engine.rs
// ============================================================================
// Module: Release Ledger Run Engine
// Description: Sequential batch-run orchestration over the pipeline stages.
// Purpose: Execute detect, correlate, compute, merge, and commit with
//          run-lock exclusivity and abort-before-commit semantics.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The run engine is the single canonical execution path for one batch run.
//! The five pipeline stages execute strictly sequentially; all computation
//! happens in memory and durable state is only touched in the final commit
//! phase. A cancelled or conflicting run leaves every persisted artifact at
//! its pre-run value. Correlation failures degrade the result; store
//! failures abort the run before the merge state is committed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::ComponentKey;
use crate::core::CorrelationInput;
use crate::core::DeploymentEvent;
use crate::core::EventDraft;
use crate::core::EventKind;
use crate::core::RunId;
use crate::core::Snapshot;
use crate::core::TagChangeFact;
use crate::core::TicketId;
use crate::core::TicketPresence;
use crate::core::Timestamp;
use crate::core::Warning;
use crate::core::WarningKind;
use crate::core::Warnings;
use crate::core::hashing::HashError;
use crate::interfaces::EventStore;
use crate::interfaces::RetentionReport;
use crate::interfaces::RunLock;
use crate::interfaces::SnapshotStore;
use crate::interfaces::StoreError;
use crate::interfaces::TicketStateStore;
use crate::runtime::correlator::FeatureToggles;
use crate::runtime::correlator::TicketCorrelation;
use crate::runtime::correlator::correlate;
use crate::runtime::detector::detect;
use crate::runtime::merge::merge_presence;
use crate::runtime::presence::PresenceConfig;
use crate::runtime::presence::compute_presence;

// ============================================================================
// SECTION: Run Settings
// ============================================================================

/// Explicit per-run configuration, resolved once at run start.
///
/// # Invariants
/// - No component reads ambient global state; everything configurable
///   arrives through this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Correlation stage toggles.
    pub toggles: FeatureToggles,
    /// Optional exact-match alias classified as QA.
    pub qa_env_alias: Option<String>,
    /// Promotion-heuristic window in hours.
    pub promotion_window_hours: u32,
    /// Retention horizon in days.
    pub retention_days: u32,
    /// Minimum days between retention passes.
    pub cleanup_interval_days: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            toggles: FeatureToggles::default(),
            qa_env_alias: None,
            promotion_window_hours: 24,
            retention_days: 90,
            cleanup_interval_days: 7,
        }
    }
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Cooperative cancellation token for a run.
///
/// Hosts enforce run budgets by cancelling the token from their scheduler;
/// the engine checks it before the commit phase so an abandoned run never
/// flushes partial state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// Shared cancellation flag.
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ============================================================================
// SECTION: Run Request and Report
// ============================================================================

/// Inputs identifying and timing one run.
///
/// # Invariants
/// - `now` is supplied by the host; the engine never reads the wall clock.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Run identifier.
    pub run_id: RunId,
    /// Instant the run started, as supplied by the host.
    pub now: Timestamp,
    /// Optional cooperative cancellation token.
    pub cancel: Option<CancelToken>,
}

/// Result of one completed run.
///
/// # Invariants
/// - `presence` is the fully merged state that was persisted.
/// - `warnings` aggregates every structured exclusion and degradation.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier.
    pub run_id: RunId,
    /// Whether this was a first run with no previous snapshot.
    pub first_run: bool,
    /// Tag-change facts detected this run.
    pub facts: BTreeMap<ComponentKey, TagChangeFact>,
    /// Number of events actually appended (after dedup).
    pub appended: u64,
    /// Merged, persisted ticket presence.
    pub presence: BTreeMap<TicketId, TicketPresence>,
    /// Structured warnings collected across all stages.
    pub warnings: Warnings,
    /// Retention pass outcome, when one ran.
    pub retention: Option<RetentionReport>,
}

// ============================================================================
// SECTION: Run Errors
// ============================================================================

/// Errors aborting a run.
///
/// # Invariants
/// - Every variant means nothing past the failing step was committed; the
///   persisted ticket presence keeps its pre-run value unless `save_all`
///   itself succeeded.
#[derive(Debug, Error)]
pub enum RunError {
    /// Another run is already active.
    #[error("run conflict: {0}")]
    Conflict(String),
    /// The run was cancelled before the commit phase.
    #[error("run cancelled before commit")]
    Cancelled,
    /// A durable store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Event identifier derivation failed.
    #[error("event hashing failed: {0}")]
    Hash(String),
}

impl From<HashError> for RunError {
    fn from(err: HashError) -> Self {
        Self::Hash(err.to_string())
    }
}

// ============================================================================
// SECTION: Run Engine
// ============================================================================

/// Batch run engine over snapshot, event, and ticket-state stores.
pub struct RunEngine<S, E, T, L> {
    /// Snapshot store implementation.
    snapshots: S,
    /// Event store implementation.
    events: E,
    /// Ticket state store implementation.
    tickets: T,
    /// Run lock implementation.
    lock: L,
    /// Per-run settings, resolved once at construction.
    settings: RunSettings,
}

impl<S, E, T, L> RunEngine<S, E, T, L>
where
    S: SnapshotStore,
    E: EventStore,
    T: TicketStateStore,
    L: RunLock,
{
    /// Creates a new run engine.
    #[must_use]
    pub const fn new(snapshots: S, events: E, tickets: T, lock: L, settings: RunSettings) -> Self {
        Self {
            snapshots,
            events,
            tickets,
            lock,
            settings,
        }
    }

    /// Returns the active settings.
    #[must_use]
    pub const fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Executes one batch run.
    ///
    /// The snapshot is the freshly fetched current state; the previously
    /// stored snapshot serves as the detector's predecessor. All reads of
    /// prior state happen up front; durable state is only written in the
    /// commit phase at the end.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Conflict`] when another run is active,
    /// [`RunError::Cancelled`] when the token fired before commit, and
    /// [`RunError::Store`] when a durable store fails.
    pub fn execute(
        &self,
        request: &RunRequest,
        snapshot: Snapshot,
        input: &CorrelationInput,
    ) -> Result<RunReport, RunError> {
        let _guard = self.lock.acquire().map_err(|err| match err {
            StoreError::Conflict(message) => RunError::Conflict(message),
            other => RunError::Store(other),
        })?;

        let mut warnings = Warnings::new();

        // One-time store bootstrap; a no-op once the persisted flag is set.
        let migration = self.events.migrate_legacy(request.now)?;
        warnings.extend(migration.warnings);

        // Snapshot-consistent reads, taken once at run start.
        let prior_tickets = self.tickets.load_all()?;
        let previous_snapshot = self.snapshots.load_current()?;

        let first_run = previous_snapshot.is_none();
        if first_run {
            warnings.push(Warning::new(
                WarningKind::FirstRun,
                "no previous snapshot; tag-change detection skipped",
            ));
        }

        let facts = detect(previous_snapshot.as_ref(), &snapshot);

        let correlation = correlate(input, &facts, self.settings.toggles);
        warnings.extend(correlation.warnings.clone());

        let presence_config = PresenceConfig {
            qa_env_alias: self.settings.qa_env_alias.clone(),
            promotion_window_hours: self.settings.promotion_window_hours,
        };
        let (current_presence, presence_warnings) =
            compute_presence(&correlation, &input.pull_requests, &facts, &presence_config);
        warnings.extend(presence_warnings);

        let (merged, merge_warnings) = merge_presence(current_presence, prior_tickets);
        warnings.extend(merge_warnings);

        if let Some(cancel) = &request.cancel
            && cancel.is_cancelled()
        {
            return Err(RunError::Cancelled);
        }

        // Commit phase: append-only events first, then ticket state, then
        // the snapshot rotation that defines the next run's predecessor. A
        // failure at any step leaves earlier steps recoverable: idempotent
        // append makes re-running safe.
        let events = self.build_events(&facts, &correlation.tickets, request.now)?;
        let appended = self.events.append(&events)?;
        self.tickets.save_all(&merged)?;
        self.snapshots.store(&snapshot)?;

        let retention = self.run_retention_if_due(request.now)?;

        Ok(RunReport {
            run_id: request.run_id.clone(),
            first_run,
            facts,
            appended,
            presence: merged,
            warnings,
            retention,
        })
    }

    /// Derives this run's durable events from facts and correlations.
    fn build_events(
        &self,
        facts: &BTreeMap<ComponentKey, TagChangeFact>,
        tickets: &BTreeMap<TicketId, TicketCorrelation>,
        now: Timestamp,
    ) -> Result<Vec<DeploymentEvent>, RunError> {
        let mut events = Vec::new();
        for fact in facts.values() {
            events.push(DeploymentEvent::derive(EventDraft::from_tag_change(fact), now)?);
        }
        for correlation in tickets.values() {
            for deployment in &correlation.time_aware_deployments {
                let draft = EventDraft {
                    kind: EventKind::Deployment,
                    project_key: deployment.key.project.clone(),
                    env_key: deployment.key.env.clone(),
                    component: deployment.key.component.clone(),
                    repo: deployment.repo.clone(),
                    from_tag: deployment.from_tag.clone(),
                    to_tag: deployment.tag.clone(),
                    deployed_at: Some(deployment.deployed_at),
                    deployer: None,
                    tag_sha: None,
                };
                events.push(DeploymentEvent::derive(draft, now)?);
            }
        }
        Ok(events)
    }

    /// Runs a retention pass when the cleanup interval has elapsed.
    fn run_retention_if_due(&self, now: Timestamp) -> Result<Option<RetentionReport>, RunError> {
        if self.settings.retention_days == 0 {
            return Ok(None);
        }
        let index = self.events.read_index()?;
        let due = index.retention.last_cleanup_at.is_none_or(|last| {
            last.saturating_add_hours(self.settings.cleanup_interval_days.saturating_mul(24)) <= now
        });
        if !due {
            return Ok(None);
        }
        let report = self.events.apply_retention(self.settings.retention_days, now)?;
        Ok(Some(report))
    }
}
