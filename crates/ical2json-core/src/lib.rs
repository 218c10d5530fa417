//! Core types: time values, events, calendars, ICS parsing and conversion

pub mod calendar;
pub mod error;
pub mod event;
pub mod ics;
pub mod time;
pub mod tracing;

pub use calendar::{Calendar, ConvertOptions, Converter, InvalidEventPolicy, OutputMode};
pub use error::{ConvertError, ConvertResult, MissingField, NormalizationError, ParseError};
pub use event::Event;
pub use ics::{ExtensionProperty, IcsCalendar, Occurrence, TimelineOptions, parse_calendar};
pub use time::EventTime;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
