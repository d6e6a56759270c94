// crates/release-ledger-core/src/runtime/version.rs
// ============================================================================
// Module: Release Ledger Version Comparator
// Description: Conservative tag-version ordering for rollback detection.
// Purpose: Decide forward/rollback direction between two artifact tags.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Rollback detection compares the incoming artifact tag against the one
//! already recorded for a stage. The comparator is deliberately
//! conservative: tags parse as dotted numeric cores with an optional `v`
//! prefix and an optional pre-release tail, and any tag that does not parse
//! yields [`VersionOrder::Unknown`], excluded from rollback detection
//! rather than guessed at.

// ============================================================================
// SECTION: Version Order
// ============================================================================

/// Direction of a tag transition relative to the recorded tag.
///
/// # Invariants
/// - `Unknown` is returned whenever either side fails to parse; callers
///   must treat it as "no rollback detected".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrder {
    /// The incoming tag is newer than or equal to the recorded tag.
    Forward,
    /// The incoming tag is strictly older than the recorded tag.
    Rollback,
    /// Direction cannot be determined; excluded from rollback detection.
    Unknown,
}

// ============================================================================
// SECTION: Parsed Version
// ============================================================================

/// Parsed form of a version tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedVersion {
    /// Numeric core components, left to right.
    core: Vec<u64>,
    /// Pre-release tail after `-`, when present.
    pre_release: Option<String>,
}

/// Parses a tag into its dotted numeric core and optional pre-release tail.
///
/// Accepts an optional leading `v`/`V`. Returns `None` when any core
/// component is not a plain decimal number.
fn parse_version(tag: &str) -> Option<ParsedVersion> {
    let trimmed = tag.trim();
    let without_prefix = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
    let (core_text, pre_release) = match without_prefix.split_once('-') {
        Some((core, tail)) if !tail.is_empty() => (core, Some(tail.to_string())),
        Some((core, _)) => (core, None),
        None => (without_prefix, None),
    };
    if core_text.is_empty() {
        return None;
    }
    let mut core = Vec::new();
    for component in core_text.split('.') {
        if component.is_empty() || !component.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        core.push(component.parse::<u64>().ok()?);
    }
    Some(ParsedVersion {
        core,
        pre_release,
    })
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Compares an incoming tag against the recorded tag.
///
/// Numeric cores compare left-to-right with missing components treated as
/// zero. Equal cores order a release above any pre-release; two
/// pre-releases compare lexically on the tail.
#[must_use]
pub fn compare_tags(incoming: &str, recorded: &str) -> VersionOrder {
    let (Some(incoming), Some(recorded)) = (parse_version(incoming), parse_version(recorded))
    else {
        return VersionOrder::Unknown;
    };

    let components = incoming.core.len().max(recorded.core.len());
    for position in 0..components {
        let left = incoming.core.get(position).copied().unwrap_or(0);
        let right = recorded.core.get(position).copied().unwrap_or(0);
        if left > right {
            return VersionOrder::Forward;
        }
        if left < right {
            return VersionOrder::Rollback;
        }
    }

    match (&incoming.pre_release, &recorded.pre_release) {
        (None, None) => VersionOrder::Forward,
        (None, Some(_)) => VersionOrder::Forward,
        (Some(_), None) => VersionOrder::Rollback,
        (Some(left), Some(right)) => {
            if left < right {
                VersionOrder::Rollback
            } else {
                VersionOrder::Forward
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
