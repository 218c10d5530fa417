//! Time values for calendar events.
//!
//! ICS start and end markers come in three shapes, and [`EventTime`] keeps
//! them apart instead of coercing everything to a timestamp:
//! - **Date**: a whole-day value (`DTSTART;VALUE=DATE:20240305`)
//! - **DateTime**: a point in time with a known UTC offset (`...Z` or `TZID=`)
//! - **Floating**: a wall-clock time without any zone information
//!
//! Serialization follows the JSON contract: dates as `YYYY-MM-DD`, date-times
//! as RFC 3339 with their offset, floating values as ISO 8601 without offset.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Represents the start or end of a calendar occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTime {
    /// A whole-day value (no time component).
    Date(NaiveDate),
    /// A specific instant, kept with the offset it was expressed in.
    DateTime(DateTime<FixedOffset>),
    /// A local wall-clock time with no zone attached.
    Floating(NaiveDateTime),
}

impl EventTime {
    /// Creates a whole-day value.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::Date(date)
    }

    /// Creates a date-time value from a UTC instant (offset `+00:00`).
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt.fixed_offset())
    }

    /// Creates a date-time value that keeps the given offset.
    pub fn from_fixed(dt: DateTime<FixedOffset>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a floating (zone-less) value.
    pub fn floating(dt: NaiveDateTime) -> Self {
        Self::Floating(dt)
    }

    /// Returns `true` for whole-day values.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns `true` for zone-less wall-clock values.
    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Floating(_))
    }

    /// Converts to a UTC instant for comparison purposes.
    ///
    /// Whole-day values compare at midnight UTC, floating values are read as UTC.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
            Self::DateTime(dt) => dt.with_timezone(&Utc),
            Self::Floating(naive) => naive.and_utc(),
        }
    }

    /// Checks if this value is strictly earlier than the given instant.
    pub fn is_before_utc(&self, dt: DateTime<Utc>) -> bool {
        self.to_utc_datetime() < dt
    }

    /// Returns this value moved by `duration`, keeping its shape, or `None`
    /// when the result leaves the representable range.
    ///
    /// Whole-day values only move by the whole days contained in `duration`.
    pub fn checked_shift(&self, duration: Duration) -> Option<Self> {
        match self {
            Self::Date(date) => date
                .checked_add_signed(Duration::days(duration.num_days()))
                .map(Self::Date),
            Self::DateTime(dt) => dt.checked_add_signed(duration).map(Self::DateTime),
            Self::Floating(naive) => naive.checked_add_signed(duration).map(Self::Floating),
        }
    }

    /// Returns the signed distance from `self` to `other`.
    pub fn until(&self, other: &EventTime) -> Duration {
        other.to_utc_datetime() - self.to_utc_datetime()
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Self::Floating(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
