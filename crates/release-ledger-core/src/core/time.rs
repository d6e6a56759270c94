// crates/release-ledger-core/src/core/time.rs
// ============================================================================
// Module: Release Ledger Time Model
// Description: Canonical timestamp representation for facts, events, and logs.
// Purpose: Provide deterministic, totally ordered time values across records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Release Ledger embeds explicit time values in every fact and event to keep
//! correlation deterministic and replayable. The core engine never reads
//! wall-clock time directly; hosts supply "now" when starting a run, and all
//! upstream timestamps arrive pre-parsed from collaborator payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds in one hour.
const MILLIS_PER_HOUR: i64 = 60 * 60 * 1_000;

/// Milliseconds in one day.
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp used in Release Ledger facts, events, and indexes.
///
/// # Invariants
/// - Values are unix epoch milliseconds, totally ordered.
/// - Values are explicitly provided by callers; the core never reads the
///   wall clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Parses an RFC 3339 date-time string into a timestamp.
    ///
    /// Returns `None` when the input does not parse; callers treat that as
    /// missing evidence rather than guessing.
    #[must_use]
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339).ok()?;
        let millis = parsed.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis).ok().map(Self)
    }

    /// Formats the timestamp as an RFC 3339 date-time string (UTC).
    ///
    /// Returns `None` for values outside the representable datetime range.
    #[must_use]
    pub fn format_rfc3339(self) -> Option<String> {
        let nanos = i128::from(self.0) * 1_000_000;
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
        datetime.format(&Rfc3339).ok()
    }

    /// Returns the timestamp moved back by whole days, saturating on overflow.
    #[must_use]
    pub const fn saturating_sub_days(self, days: u32) -> Self {
        Self(self.0.saturating_sub(days as i64 * MILLIS_PER_DAY))
    }

    /// Returns the timestamp moved forward by whole hours, saturating on overflow.
    #[must_use]
    pub const fn saturating_add_hours(self, hours: u32) -> Self {
        Self(self.0.saturating_add(hours as i64 * MILLIS_PER_HOUR))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format_rfc3339() {
            Some(rendered) => f.write_str(&rendered),
            None => self.0.fmt(f),
        }
    }
}
