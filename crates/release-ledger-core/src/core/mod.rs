// crates/release-ledger-core/src/core/mod.rs
// ============================================================================
// Module: Release Ledger Core Types
// Description: Canonical snapshot, fact, event, and presence structures.
// Purpose: Provide stable, serializable types for the correlation pipeline.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Release Ledger core types define snapshots, derived and external facts,
//! durable deployment events, and per-ticket presence state. These types are
//! the canonical source of truth for everything the stores persist and the
//! reporting surfaces consume.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod events;
pub mod facts;
pub mod hashing;
pub mod identifiers;
pub mod index;
pub mod presence;
pub mod snapshot;
pub mod time;
pub mod warnings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::DeploymentEvent;
pub use events::EventDraft;
pub use events::EventId;
pub use events::EventKind;
pub use facts::BranchFact;
pub use facts::BuildFact;
pub use facts::CorrelationInput;
pub use facts::PullRequestFact;
pub use facts::TagChangeFact;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::BranchName;
pub use identifiers::BuildId;
pub use identifiers::CommitSha;
pub use identifiers::ComponentKey;
pub use identifiers::ComponentName;
pub use identifiers::EnvKey;
pub use identifiers::ProjectKey;
pub use identifiers::RepoName;
pub use identifiers::RunId;
pub use identifiers::TicketId;
pub use index::EventIndex;
pub use index::ProjectStats;
pub use index::RetentionState;
pub use presence::Confidence;
pub use presence::EvidenceSource;
pub use presence::PresenceEvidence;
pub use presence::Stage;
pub use presence::StagePresence;
pub use presence::TicketPresence;
pub use presence::TimelineEntry;
pub use snapshot::ComponentState;
pub use snapshot::EnvironmentSnapshot;
pub use snapshot::ProjectSnapshot;
pub use snapshot::Snapshot;
pub use time::Timestamp;
pub use warnings::Warning;
pub use warnings::WarningKind;
pub use warnings::Warnings;
