//! Content-line level parsing of an iCalendar document.
//!
//! Grammar work (unfolding, content lines, nested components) is done by the
//! `icalendar` crate's parser; this module reads the calendar-level properties
//! and turns each `VEVENT` into a [`VEvent`] ready for timeline construction.

use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use tracing::{debug, trace, warn};

use crate::error::ParseError;
use crate::time::EventTime;

use super::ExtensionProperty;

/// VCALENDAR properties modelled by RFC 5545 itself; everything else is an
/// extension property.
const STANDARD_CALENDAR_PROPERTIES: [&str; 4] = ["PRODID", "VERSION", "CALSCALE", "METHOD"];

/// A time value together with the zone it was expressed in.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ZonedTime {
    pub time: EventTime,
    pub zone: Option<Tz>,
}

/// A `VEVENT` as written in the document, before recurrence expansion.
#[derive(Debug, Clone, Default)]
pub(crate) struct VEvent {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub start: Option<ZonedTime>,
    /// `DTEND`, or `DTSTART + DURATION` when only a duration is given.
    pub end: Option<EventTime>,
    pub rrule: Option<String>,
    pub rdates: Vec<ZonedTime>,
    pub exdates: Vec<ZonedTime>,
    pub recurrence_id: Option<EventTime>,
}

/// Parses raw ICS text into calendar properties and events.
pub(crate) fn read_document(text: &str) -> Result<(Vec<ExtensionProperty>, Vec<VEvent>), ParseError> {
    let unfolded = unfold(text);
    ensure_calendar_root(&unfolded)?;

    let calendar = read_calendar(&unfolded).map_err(|e| ParseError::new(e.to_string()))?;

    // Depending on the parser version the VCALENDAR wrapper is either
    // flattened into the result or kept as the single root component.
    let (properties, components) = match calendar.components.as_slice() {
        [root] if root.name.as_ref().eq_ignore_ascii_case("VCALENDAR") => {
            (&root.properties, &root.components)
        }
        _ => (&calendar.properties, &calendar.components),
    };

    let extensions: Vec<ExtensionProperty> = properties
        .iter()
        .filter(|p| {
            !STANDARD_CALENDAR_PROPERTIES
                .iter()
                .any(|std| p.name.as_ref().eq_ignore_ascii_case(std))
        })
        .map(|p| ExtensionProperty::new(p.name.as_ref().to_ascii_lowercase(), unescape_text(p.val.as_ref())))
        .collect();

    let events = components
        .iter()
        .filter(|c| c.name.as_ref().eq_ignore_ascii_case("VEVENT"))
        .map(parse_vevent)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        properties = extensions.len(),
        events = events.len(),
        "Read ICS document"
    );

    Ok((extensions, events))
}

/// Rejects documents that do not open with `BEGIN:VCALENDAR`.
fn ensure_calendar_root(unfolded: &str) -> Result<(), ParseError> {
    let first = unfolded
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty());

    match first {
        Some(line) if line.eq_ignore_ascii_case("BEGIN:VCALENDAR") => Ok(()),
        Some(line) => Err(ParseError::new(format!(
            "expected BEGIN:VCALENDAR, found `{}`",
            truncate(line, 40)
        ))),
        None => Err(ParseError::new("empty document")),
    }
}

/// Parses a single VEVENT component.
fn parse_vevent(component: &Component<'_>) -> Result<VEvent, ParseError> {
    let uid = find_prop(component, "UID").map(|p| p.val.as_ref().trim().to_string());
    let context = uid.as_deref().unwrap_or("<no uid>");

    let summary = find_prop(component, "SUMMARY").map(|p| unescape_text(p.val.as_ref()));

    let start = find_prop(component, "DTSTART")
        .map(|p| parse_time_property(p, context))
        .transpose()?;

    let end = match find_prop(component, "DTEND") {
        Some(p) => Some(parse_time_property(p, context)?.time),
        None => match (find_prop(component, "DURATION"), &start) {
            (Some(p), Some(start)) => {
                let duration = parse_duration(p.val.as_ref(), context)?;
                let end = start.time.checked_shift(duration).ok_or_else(|| {
                    ParseError::new(format!(
                        "event {}: duration `{}` moves the end out of range",
                        context,
                        p.val.as_ref().trim()
                    ))
                })?;
                Some(end)
            }
            _ => None,
        },
    };

    let rrule = find_prop(component, "RRULE").map(|p| p.val.as_ref().trim().to_string());

    let rdates = collect_times(component, "RDATE", context)?;
    let exdates = collect_times(component, "EXDATE", context)?;

    let recurrence_id = find_prop(component, "RECURRENCE-ID")
        .map(|p| parse_time_property(p, context).map(|z| z.time))
        .transpose()?;

    trace!(uid = %context, start = ?start, end = ?end, "Parsed VEVENT");

    Ok(VEvent {
        uid,
        summary,
        start,
        end,
        rrule,
        rdates,
        exdates,
        recurrence_id,
    })
}

/// Returns the first property with the given name (names are case-insensitive).
fn find_prop<'c, 'a>(component: &'c Component<'a>, name: &str) -> Option<&'c Property<'a>> {
    component
        .properties
        .iter()
        .find(|p| p.name.as_ref().eq_ignore_ascii_case(name))
}

/// Returns the value of a property parameter, without surrounding quotes.
fn param<'p>(prop: &'p Property<'_>, key: &str) -> Option<&'p str> {
    prop.params
        .iter()
        .find(|p| p.key.as_ref().eq_ignore_ascii_case(key))
        .and_then(|p| p.val.as_ref())
        .map(|v| v.as_ref().trim_matches('"'))
}

/// Collects every value of a possibly repeated, comma-separated time property.
fn collect_times(component: &Component<'_>, name: &str, context: &str) -> Result<Vec<ZonedTime>, ParseError> {
    let mut times = Vec::new();
    for prop in component
        .properties
        .iter()
        .filter(|p| p.name.as_ref().eq_ignore_ascii_case(name))
    {
        let is_date = param(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));
        let zone = param(prop, "TZID").and_then(resolve_zone);
        for value in prop.val.as_ref().split(',').map(str::trim).filter(|v| !v.is_empty()) {
            // RDATE may also carry periods; only the period start matters here.
            let value = value.split('/').next().unwrap_or(value);
            times.push(parse_time_value(value, is_date, param(prop, "TZID"), zone, context)?);
        }
    }
    Ok(times)
}

/// Parses a DTSTART/DTEND/RECURRENCE-ID style property.
fn parse_time_property(prop: &Property<'_>, context: &str) -> Result<ZonedTime, ParseError> {
    let is_date = param(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));
    let tzid = param(prop, "TZID");
    let zone = tzid.and_then(resolve_zone);
    parse_time_value(prop.val.as_ref().trim(), is_date, tzid, zone, context)
}

/// Parses one date or date-time value.
///
/// Handles:
/// - `20240305` (date, with or without `VALUE=DATE`)
/// - `20240101T090000Z` (UTC)
/// - `20240101T090000` with `TZID=` (zoned, resolved to its offset)
/// - `20240101T090000` without zone (floating)
fn parse_time_value(
    value: &str,
    is_date: bool,
    tzid: Option<&str>,
    zone: Option<Tz>,
    context: &str,
) -> Result<ZonedTime, ParseError> {
    let invalid = || ParseError::new(format!("event {}: invalid date-time value `{}`", context, value));

    if is_date || (value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit())) {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| invalid())?;
        return Ok(ZonedTime {
            time: EventTime::from_date(date),
            zone: None,
        });
    }

    if let Some(utc) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").map_err(|_| invalid())?;
        return Ok(ZonedTime {
            time: EventTime::from_utc(Utc.from_utc_datetime(&naive)),
            zone: None,
        });
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").map_err(|_| invalid())?;

    match (tzid, zone) {
        (Some(_), Some(tz)) => match localize(&tz, naive) {
            Some(time) => Ok(ZonedTime {
                time,
                zone: Some(tz),
            }),
            None => {
                warn!(event = %context, tzid = %tz.name(), value = %value, "Local time does not exist in zone, keeping it floating");
                Ok(ZonedTime {
                    time: EventTime::floating(naive),
                    zone: None,
                })
            }
        },
        (Some(tzid), None) => {
            warn!(event = %context, tzid = %tzid, "Unknown TZID, keeping value floating");
            Ok(ZonedTime {
                time: EventTime::floating(naive),
                zone: None,
            })
        }
        (None, _) => Ok(ZonedTime {
            time: EventTime::floating(naive),
            zone: None,
        }),
    }
}

/// Resolves a TZID parameter to an IANA zone.
fn resolve_zone(tzid: &str) -> Option<Tz> {
    tzid.trim().trim_start_matches('/').parse::<Tz>().ok()
}

/// Attaches a zone to a wall-clock time, stepping over DST gaps.
fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<EventTime> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            let later = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&later).earliest()
        })
        .map(|dt| EventTime::from_fixed(dt.fixed_offset()))
}

/// Parses an RFC 5545 DURATION value (`PT1H`, `P1D`, `-PT15M`, `P2W`).
fn parse_duration(value: &str, context: &str) -> Result<Duration, ParseError> {
    let value = value.trim();
    let invalid = || ParseError::new(format!("event {}: invalid duration `{}`", context, value));

    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let parsed = iso8601::duration(body).map_err(|_| invalid())?;
    let std_duration: std::time::Duration = parsed.into();
    let duration = Duration::from_std(std_duration).map_err(|_| invalid())?;

    Ok(if negative { -duration } else { duration })
}

/// Undoes RFC 5545 TEXT escaping (`\n`, `\,`, `\;`, `\\`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}
