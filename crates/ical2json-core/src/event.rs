//! The canonical event record.
//!
//! [`Event`] is what one timeline [`Occurrence`] becomes once normalized:
//! a UID, a (possibly empty) summary, a start and an optional end. Whole-day
//! and timed values stay distinct all the way into the JSON output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{MissingField, NormalizationError};
use crate::ics::Occurrence;
use crate::time::EventTime;

/// One calendar occurrence in normalized form.
///
/// Serializes as `{"uid", "summary", "start", "end"}`; `end` is `null` when
/// the source had no end marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Unique identifier within the calendar (not checked for uniqueness).
    pub uid: String,
    /// The event title, empty when the source has none.
    pub summary: String,
    /// When the event starts.
    pub start: EventTime,
    /// When the event ends, if the source says so.
    pub end: Option<EventTime>,
}

impl Event {
    /// Creates an event with the required fields.
    pub fn new(uid: impl Into<String>, summary: impl Into<String>, start: EventTime) -> Self {
        Self {
            uid: uid.into(),
            summary: summary.into(),
            start,
            end: None,
        }
    }

    /// Builder method to set the end.
    pub fn with_end(mut self, end: EventTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Normalizes one timeline occurrence.
    ///
    /// The end is passed through as-is, even when it precedes the start.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizationError`] when the occurrence has no UID (or an
    /// empty one) or no start.
    pub fn from_occurrence(occurrence: &Occurrence) -> Result<Self, NormalizationError> {
        let uid = match occurrence.uid.as_deref() {
            Some(uid) if !uid.is_empty() => uid,
            _ => return Err(NormalizationError::missing(None, MissingField::Uid)),
        };
        let start = occurrence
            .start
            .ok_or_else(|| NormalizationError::missing(Some(uid), MissingField::Start))?;

        Ok(Self {
            uid: uid.to_string(),
            summary: occurrence.summary.clone().unwrap_or_default(),
            start,
            end: occurrence.end,
        })
    }

    /// Returns true if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    /// Returns true if the event starts at or after `now`.
    pub fn starts_at_or_after(&self, now: DateTime<Utc>) -> bool {
        !self.start.is_before_utc(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> EventTime {
        EventTime::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn occurrence_with_all_fields() {
        let start = EventTime::from_utc(utc(2024, 1, 1, 9, 0));
        let end = EventTime::from_utc(utc(2024, 1, 1, 9, 30));
        let occurrence = Occurrence::new("abc-1", start)
            .with_summary("Standup")
            .with_end(end);

        let event = Event::from_occurrence(&occurrence).unwrap();
        assert_eq!(event, Event::new("abc-1", "Standup", start).with_end(end));
    }

    #[test]
    fn missing_end_stays_null() {
        let occurrence = Occurrence::new("day-1", date(2024, 3, 5));
        let event = Event::from_occurrence(&occurrence).unwrap();
        assert!(event.is_all_day());
        assert_eq!(event.end, None);
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"uid":"day-1","summary":"","start":"2024-03-05","end":null}"#
        );
    }

    #[test]
    fn end_before_start_passes_through() {
        let start = EventTime::from_utc(utc(2024, 1, 1, 10, 0));
        let end = EventTime::from_utc(utc(2024, 1, 1, 9, 0));
        let occurrence = Occurrence::new("odd", start).with_end(end);
        assert_eq!(Event::from_occurrence(&occurrence).unwrap().end, Some(end));
    }

    #[test]
    fn missing_start_is_an_error() {
        let occurrence = Occurrence {
            uid: Some("no-start".into()),
            ..Default::default()
        };
        let err = Event::from_occurrence(&occurrence).unwrap_err();
        assert_eq!(err, NormalizationError::missing(Some("no-start"), MissingField::Start));
    }

    #[test]
    fn missing_or_empty_uid_is_an_error() {
        let start = date(2024, 3, 5);
        let missing = Occurrence {
            start: Some(start),
            ..Default::default()
        };
        assert_eq!(Event::from_occurrence(&missing).unwrap_err().field, MissingField::Uid);

        let empty = Occurrence::new("", start);
        assert_eq!(Event::from_occurrence(&empty).unwrap_err().field, MissingField::Uid);
    }

    #[test]
    fn starts_at_or_after_is_inclusive() {
        let now = utc(2024, 3, 1, 0, 0);
        let at = Event::new("a", "", EventTime::from_utc(now));
        let before = Event::new("b", "", date(2024, 1, 1));
        let after = Event::new("c", "", date(2024, 6, 1));

        assert!(at.starts_at_or_after(now));
        assert!(!before.starts_at_or_after(now));
        assert!(after.starts_at_or_after(now));
    }
}
