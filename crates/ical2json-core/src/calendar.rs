//! The canonical calendar record and the conversion entry point.
//!
//! A [`Calendar`] is assembled from a parsed [`IcsCalendar`]: its name and
//! color come from the `x-wr-calname` / `x-apple-calendar-color` extension
//! properties, its events from the timeline in order.
//!
//! Two JSON shapes are supported, selected by [`OutputMode`]:
//!
//! - `Typed` (default): `{"name", "color", "events": [{"uid", "summary", "start", "end"}]}`
//! - `Extras`: `{"x-wr-calname", ...every other extension property..., "events":
//!   [{"uid", "dtstart", "summary", "dtend"}]}`

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{Span, debug, info, warn};

use crate::error::{ConvertResult, NormalizationError};
use crate::event::Event;
use crate::ics::{IcsCalendar, TimelineOptions, parse_calendar};
use crate::time::EventTime;

/// Extension property holding the calendar display name.
pub const NAME_PROPERTY: &str = "x-wr-calname";
/// Extension property holding the calendar display color.
pub const COLOR_PROPERTY: &str = "x-apple-calendar-color";

const DEFAULT_NAME: &str = "";
const DEFAULT_EXTRAS_NAME: &str = "n/a";
const DEFAULT_COLOR: &str = "#000000";

/// Which JSON shape a [`Calendar`] serializes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Fixed schema: `name`, `color`, `events`.
    #[default]
    Typed,
    /// Every extension property under its own name, plus `events`.
    Extras,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typed => "typed",
            Self::Extras => "extras",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "typed" => Ok(Self::Typed),
            "extras" => Ok(Self::Extras),
            other => Err(format!("unknown output mode `{other}` (expected `typed` or `extras`)")),
        }
    }
}

/// What to do with an occurrence that cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidEventPolicy {
    /// Abort the whole conversion with the first error.
    #[default]
    Fail,
    /// Drop the occurrence, log a warning and continue.
    Skip,
}

/// Options for a raw-ICS-to-calendar conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub output_mode: OutputMode,
    pub invalid_events: InvalidEventPolicy,
    pub timeline: TimelineOptions,
}

impl ConvertOptions {
    /// Sets the output mode.
    #[must_use]
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Sets the invalid-event policy.
    #[must_use]
    pub fn with_invalid_events(mut self, policy: InvalidEventPolicy) -> Self {
        self.invalid_events = policy;
        self
    }

    /// Sets the timeline options.
    #[must_use]
    pub fn with_timeline(mut self, timeline: TimelineOptions) -> Self {
        self.timeline = timeline;
        self
    }
}

/// A converted calendar.
///
/// Immutable once built, apart from [`Calendar::from_now`] which consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    properties: BTreeMap<String, String>,
    events: Vec<Event>,
    mode: OutputMode,
}

impl Calendar {
    /// Creates a calendar from extension properties and events.
    ///
    /// Later properties with the same name replace earlier ones.
    pub fn new<I, K, V>(properties: I, events: Vec<Event>, mode: OutputMode) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let properties = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            properties,
            events,
            mode,
        }
    }

    /// Normalizes an already-parsed calendar.
    ///
    /// Events keep timeline order. With [`InvalidEventPolicy::Skip`] an
    /// occurrence that cannot be normalized is dropped instead of failing.
    ///
    /// # Errors
    ///
    /// Returns the first [`NormalizationError`] under [`InvalidEventPolicy::Fail`].
    pub fn from_parsed(
        parsed: &IcsCalendar,
        options: &ConvertOptions,
    ) -> Result<Self, NormalizationError> {
        let mut events = Vec::with_capacity(parsed.timeline().len());
        for occurrence in parsed.timeline() {
            match Event::from_occurrence(occurrence) {
                Ok(event) => events.push(event),
                Err(err) if options.invalid_events == InvalidEventPolicy::Skip => {
                    warn!(error = %err, "skipping invalid event");
                }
                Err(err) => return Err(err),
            }
        }

        let properties = parsed
            .properties()
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_str()));
        Ok(Self::new(properties, events, options.output_mode))
    }

    /// Parses and normalizes raw ICS text.
    ///
    /// # Errors
    ///
    /// Returns a parse error for text that is not ICS, or a normalization
    /// error per [`Calendar::from_parsed`].
    pub fn from_ics(text: &str, options: &ConvertOptions) -> ConvertResult<Self> {
        let parsed = parse_calendar(text, &options.timeline)?;
        Ok(Self::from_parsed(&parsed, options)?)
    }

    /// The display name, or the mode's default when absent.
    pub fn name(&self) -> &str {
        match self.properties.get(NAME_PROPERTY) {
            Some(name) => name,
            None if self.mode == OutputMode::Extras => DEFAULT_EXTRAS_NAME,
            None => DEFAULT_NAME,
        }
    }

    /// The display color, `#000000` when absent.
    pub fn color(&self) -> &str {
        self.properties
            .get(COLOR_PROPERTY)
            .map_or(DEFAULT_COLOR, String::as_str)
    }

    /// Extension properties not promoted to `name` or `color`.
    pub fn extras(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .filter(|(k, _)| k.as_str() != NAME_PROPERTY && k.as_str() != COLOR_PROPERTY)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The events, in timeline order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The output mode this calendar serializes with.
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Returns a copy of this calendar serializing with `mode`.
    #[must_use]
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keeps only the events starting at or after `now`.
    #[must_use]
    #[allow(clippy::wrong_self_convention)]
    pub fn from_now(mut self, now: DateTime<Utc>) -> Self {
        let before = self.events.len();
        self.events.retain(|event| event.starts_at_or_after(now));
        debug!(kept = self.events.len(), dropped = before - self.events.len(), "applied from-now filter");
        self
    }
}

/// Event shape used by [`OutputMode::Extras`].
struct ExtrasEvent<'a>(&'a Event);

impl Serialize for ExtrasEvent<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Event", 4)?;
        s.serialize_field("uid", &self.0.uid)?;
        s.serialize_field("dtstart", &self.0.start)?;
        s.serialize_field("summary", &self.0.summary)?;
        s.serialize_field::<Option<EventTime>>("dtend", &self.0.end)?;
        s.end()
    }
}

impl Serialize for Calendar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.mode {
            OutputMode::Typed => {
                let mut s = serializer.serialize_struct("Calendar", 3)?;
                s.serialize_field("name", self.name())?;
                s.serialize_field("color", self.color())?;
                s.serialize_field("events", &self.events)?;
                s.end()
            }
            OutputMode::Extras => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry(NAME_PROPERTY, self.name())?;
                // `events` is reserved for the event list.
                for (key, value) in &self.properties {
                    if key != NAME_PROPERTY && key != "events" {
                        map.serialize_entry(key, value)?;
                    }
                }
                let events: Vec<ExtrasEvent<'_>> = self.events.iter().map(ExtrasEvent).collect();
                map.serialize_entry("events", &events)?;
                map.end()
            }
        }
    }
}

/// Converts raw ICS text into [`Calendar`]s with fixed options.
///
/// Each conversion is logged under the converter's span, so callers decide
/// where conversion logs land instead of relying on ambient state.
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConvertOptions,
    span: Span,
}

impl Converter {
    /// Creates a converter logging under a fresh `convert` span.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            span: tracing::info_span!("convert", mode = %options.output_mode),
        }
    }

    /// Replaces the span conversions are logged under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The options this converter applies.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Parses and normalizes raw ICS text.
    ///
    /// # Errors
    ///
    /// See [`Calendar::from_ics`].
    pub fn convert(&self, text: &str) -> ConvertResult<Calendar> {
        self.span.in_scope(|| {
            debug!(bytes = text.len(), "converting ICS document");
            let calendar = Calendar::from_ics(text, &self.options)
                .inspect_err(|err| debug!(kind = err.kind(), error = %err, "conversion failed"))?;
            info!(
                name = calendar.name(),
                events = calendar.events().len(),
                "converted calendar"
            );
            Ok(calendar)
        })
    }

    /// Normalizes an already-parsed calendar.
    ///
    /// # Errors
    ///
    /// See [`Calendar::from_parsed`].
    pub fn normalize(&self, parsed: &IcsCalendar) -> Result<Calendar, NormalizationError> {
        self.span
            .in_scope(|| Calendar::from_parsed(parsed, &self.options))
    }
}
