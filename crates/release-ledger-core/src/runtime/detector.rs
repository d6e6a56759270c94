// crates/release-ledger-core/src/runtime/detector.rs
// ============================================================================
// Module: Release Ledger Tag-Change Detector
// Description: Pure diff of two snapshots into tag-change facts.
// Purpose: Detect component tag transitions between consecutive snapshots.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The detector is a pure function over the previous and current snapshot.
//! It detects *change*, not absolute state: a fact is emitted only when a
//! component is present in both snapshots with two non-empty, differing
//! tags. Pure string inequality on the immediate predecessor: no fuzzy
//! matching and no semantic version comparison happens here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::ComponentKey;
use crate::core::Snapshot;
use crate::core::TagChangeFact;

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Diffs two snapshots into tag-change facts keyed by component.
///
/// A missing previous snapshot (first run) yields an empty map; this is a
/// defined, not erroneous, outcome.
#[must_use]
pub fn detect(
    prev: Option<&Snapshot>,
    current: &Snapshot,
) -> BTreeMap<ComponentKey, TagChangeFact> {
    let Some(prev) = prev else {
        return BTreeMap::new();
    };

    let mut facts = BTreeMap::new();
    for (key, state) in current.iter_components() {
        let Some(prev_state) = prev.component(&key) else {
            continue;
        };
        if state.tag.is_empty() || prev_state.tag.is_empty() {
            continue;
        }
        if state.tag == prev_state.tag {
            continue;
        }
        facts.insert(
            key.clone(),
            TagChangeFact {
                key,
                from_tag: prev_state.tag.clone(),
                to_tag: state.tag.clone(),
                deployed_at: state.deployed_at,
                repo: state.repo.clone(),
                branch: state.branch.clone(),
            },
        );
    }
    facts
}
