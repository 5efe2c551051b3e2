// crates/gundi-dispatcher-core/src/core/time.rs
// ============================================================================
// Module: Gundi Dispatcher Time Model
// Description: Canonical UTC timestamps and clock abstraction.
// Purpose: Keep wall-clock reads behind an injectable clock for deterministic tests.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! [`Timestamp`] wraps a UTC [`OffsetDateTime`] and serializes as RFC 3339.
//! Dispatch code never calls the system clock directly; it asks a [`Clock`].
//! Invariants:
//! - Timestamps are always normalized to UTC.
//! - [`SystemClock`] is the only implementation that reads wall-clock time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC timestamp used in dispatch records and system events.
///
/// # Invariants
/// - The wrapped value is always at UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Creates a timestamp, normalizing the offset to UTC.
    #[must_use]
    pub fn new(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    /// Creates a timestamp from whole unix seconds.
    ///
    /// Returns `None` when the value is outside the supported range.
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds).ok().map(Self)
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`time::error::Parse`] when the input is not RFC 3339.
    pub fn parse_rfc3339(value: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(value, &Rfc3339).map(Self::new)
    }

    /// Returns the underlying date-time.
    #[must_use]
    pub const fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns whole unix seconds.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Returns the signed age of this timestamp relative to `now`.
    ///
    /// Future timestamps yield a negative age.
    #[must_use]
    pub fn age_at(&self, now: Self) -> time::Duration {
        now.0 - self.0
    }

    /// Returns a timestamp shifted back by `duration`.
    #[must_use]
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        let shift = time::Duration::try_from(duration).unwrap_or(time::Duration::MAX);
        Self(self.0.saturating_sub(shift))
    }

    /// Returns a timestamp shifted forward by `duration`.
    #[must_use]
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let shift = time::Duration::try_from(duration).unwrap_or(time::Duration::MAX);
        Self(self.0.saturating_add(shift))
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0.unix_timestamp()),
        }
    }
}

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(OffsetDateTime::now_utc())
    }
}

/// Clock pinned to a single instant.
///
/// # Invariants
/// - Every call to [`Clock::now`] returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    /// Creates a clock that always reports `now`.
    #[must_use]
    pub const fn new(now: Timestamp) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
