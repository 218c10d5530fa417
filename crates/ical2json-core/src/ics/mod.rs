//! ICS/iCalendar parsing.
//!
//! This module turns raw iCalendar (RFC 5545) text into an [`IcsCalendar`]:
//! the calendar's extension properties plus a timeline of resolved
//! [`Occurrence`]s, with recurring events already expanded.
//!
//! # Example
//!
//! ```ignore
//! use ical2json_core::ics::{parse_calendar, TimelineOptions};
//!
//! let calendar = parse_calendar(&ics_text, &TimelineOptions::default())?;
//! for occurrence in calendar.timeline() {
//!     println!("{:?} at {:?}", occurrence.summary, occurrence.start);
//! }
//! ```

mod parse;
mod timeline;

use crate::error::ParseError;
use crate::time::EventTime;

/// A calendar-level property that RFC 5545 does not model itself.
///
/// Names are reported lower-case (`x-wr-calname`), values unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionProperty {
    pub name: String,
    pub value: String,
}

impl ExtensionProperty {
    /// Creates a new extension property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One concrete instance of an event on the timeline.
///
/// Fields are optional here because the document may omit them; deciding
/// which absences are fatal is the normalizer's job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Occurrence {
    /// The event UID.
    pub uid: Option<String>,
    /// The event title.
    pub summary: Option<String>,
    /// When this instance starts.
    pub start: Option<EventTime>,
    /// When this instance ends, if the document says so.
    pub end: Option<EventTime>,
    /// The original start of a recurring instance.
    pub recurrence_id: Option<EventTime>,
}

impl Occurrence {
    /// Creates an occurrence with a UID and start.
    pub fn new(uid: impl Into<String>, start: EventTime) -> Self {
        Self {
            uid: Some(uid.into()),
            start: Some(start),
            ..Default::default()
        }
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the end.
    pub fn with_end(mut self, end: EventTime) -> Self {
        self.end = Some(end);
        self
    }
}

/// Options controlling timeline construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineOptions {
    /// Maximum number of instances generated per recurring series.
    pub max_instances: u16,
}

impl TimelineOptions {
    /// Default instance cap for a recurring series.
    pub const DEFAULT_MAX_INSTANCES: u16 = 1000;

    /// Sets the instance cap.
    #[must_use]
    pub fn with_max_instances(mut self, max_instances: u16) -> Self {
        self.max_instances = max_instances;
        self
    }
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            max_instances: Self::DEFAULT_MAX_INSTANCES,
        }
    }
}

/// A parsed calendar: extension properties and the event timeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IcsCalendar {
    properties: Vec<ExtensionProperty>,
    timeline: Vec<Occurrence>,
}

impl IcsCalendar {
    /// Creates a calendar from already-resolved parts.
    pub fn new(properties: Vec<ExtensionProperty>, timeline: Vec<Occurrence>) -> Self {
        Self {
            properties,
            timeline,
        }
    }

    /// Extension properties in document order.
    pub fn properties(&self) -> &[ExtensionProperty] {
        &self.properties
    }

    /// Occurrences in chronological order.
    pub fn timeline(&self) -> &[Occurrence] {
        &self.timeline
    }
}

/// Parses ICS text into an [`IcsCalendar`].
///
/// # Errors
///
/// Returns [`ParseError`] if the text does not start with `BEGIN:VCALENDAR`,
/// is not well-formed, or carries unparseable date-time or recurrence values.
pub fn parse_calendar(text: &str, options: &TimelineOptions) -> Result<IcsCalendar, ParseError> {
    let (properties, events) = parse::read_document(text)?;
    let timeline = timeline::build_timeline(events, options)?;
    Ok(IcsCalendar::new(properties, timeline))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_properties_and_timeline() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   X-WR-CALNAME:Team Sync\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:abc-1\r\n\
                   SUMMARY:Standup\r\n\
                   DTSTART:20240101T090000Z\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let calendar = parse_calendar(ics, &TimelineOptions::default()).unwrap();
        assert_eq!(
            calendar.properties(),
            &[ExtensionProperty::new("x-wr-calname", "Team Sync")]
        );
        assert_eq!(calendar.timeline().len(), 1);
        assert_eq!(calendar.timeline()[0].uid.as_deref(), Some("abc-1"));
    }

    #[test]
    fn folded_lines_are_joined() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:fold-1\r\n\
                   SUMMARY:A very long\r\n  meeting title\r\n\
                   DTSTART:20240101T090000Z\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let calendar = parse_calendar(ics, &TimelineOptions::default()).unwrap();
        assert_eq!(
            calendar.timeline()[0].summary.as_deref(),
            Some("A very long meeting title")
        );
    }

    #[test]
    fn missing_calendar_root_fails() {
        let ics = "VERSION:2.0\r\nBEGIN:VEVENT\r\nUID:x\r\nEND:VEVENT\r\n";
        assert!(parse_calendar(ics, &TimelineOptions::default()).is_err());
    }

    #[test]
    fn default_instance_cap() {
        assert_eq!(TimelineOptions::default().max_instances, 1000);
        assert_eq!(TimelineOptions::default().with_max_instances(10).max_instances, 10);
    }
}
