//! Timeline construction: recurrence expansion and chronological ordering.
//!
//! Expands RRULE masters into individual instances (capped per series),
//! respecting EXDATE/RDATE and RECURRENCE-ID overrides, then orders every
//! occurrence by its start instant.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::time::EventTime;

use super::parse::{VEvent, ZonedTime};
use super::{Occurrence, TimelineOptions};

/// Builds the ordered occurrence sequence for a document's events.
pub(crate) fn build_timeline(
    events: Vec<VEvent>,
    options: &TimelineOptions,
) -> Result<Vec<Occurrence>, ParseError> {
    let recurring: Vec<String> = events
        .iter()
        .filter(|e| is_recurring(e) && e.start.is_some())
        .filter_map(|e| e.uid.clone())
        .collect();

    // Instance overrides of a recurring series, keyed by series UID.
    let mut overrides: HashMap<String, Vec<VEvent>> = HashMap::new();
    let mut standalone = Vec::new();
    for event in events {
        match (&event.uid, &event.recurrence_id) {
            (Some(uid), Some(_)) if recurring.contains(uid) => {
                overrides.entry(uid.clone()).or_default().push(event);
            }
            _ => standalone.push(event),
        }
    }

    let mut timeline = Vec::new();
    for event in standalone {
        match &event.start {
            Some(start) if is_recurring(&event) => {
                let series_overrides = event
                    .uid
                    .as_ref()
                    .and_then(|uid| overrides.get_mut(uid));
                expand_series(&event, start, options, series_overrides, &mut timeline)?;
            }
            _ => timeline.push(single(event)),
        }
    }

    // Overrides whose original instance was not generated still happened.
    let mut leftovers: Vec<_> = overrides.into_values().flatten().collect();
    leftovers.sort_by_key(|e| e.recurrence_id.map(|r| r.to_utc_datetime()));
    timeline.extend(leftovers.into_iter().map(single));

    timeline.sort_by_key(|o| o.start.map(|s| s.to_utc_datetime()));

    debug!(occurrences = timeline.len(), "Built timeline");

    Ok(timeline)
}

/// An event is a series when it has a rule or extra dates.
fn is_recurring(event: &VEvent) -> bool {
    event.rrule.is_some() || !event.rdates.is_empty()
}

/// Turns a non-recurring event (or an override) into a single occurrence.
fn single(event: VEvent) -> Occurrence {
    Occurrence {
        uid: event.uid,
        summary: event.summary,
        start: event.start.map(|s| s.time),
        end: event.end,
        recurrence_id: event.recurrence_id,
    }
}

/// Expands a recurring master, substituting overrides for matching instances.
fn expand_series(
    master: &VEvent,
    start: &ZonedTime,
    options: &TimelineOptions,
    mut overrides: Option<&mut Vec<VEvent>>,
    timeline: &mut Vec<Occurrence>,
) -> Result<(), ParseError> {
    let uid = master.uid.as_deref().unwrap_or("<no uid>");
    let starts = match &master.rrule {
        Some(rule) => rule_instances(master, rule, start, options, uid)?,
        None => date_instances(master, start, options, uid),
    };

    let duration = master.end.map(|end| start.time.until(&end));

    for instance_start in &starts {
        let instant = instance_start.to_utc_datetime();

        let replaced = overrides.as_deref_mut().and_then(|list| {
            list.iter()
                .position(|o| o.recurrence_id.map(|r| r.to_utc_datetime()) == Some(instant))
                .map(|idx| list.swap_remove(idx))
        });

        if let Some(exception) = replaced {
            timeline.push(single(exception));
            continue;
        }

        let end = match duration {
            Some(d) => Some(instance_start.checked_shift(d).ok_or_else(|| {
                ParseError::new(format!(
                    "event {}: end of instance {} is out of range",
                    uid, instance_start
                ))
            })?),
            None => None,
        };
        timeline.push(Occurrence {
            uid: master.uid.clone(),
            summary: master.summary.clone(),
            start: Some(*instance_start),
            end,
            recurrence_id: Some(*instance_start),
        });
    }

    debug!(uid = %uid, instances = starts.len(), "Expanded recurring event");

    Ok(())
}

/// Instance starts generated by an RRULE (plus RDATE, minus EXDATE).
fn rule_instances(
    master: &VEvent,
    rule: &str,
    start: &ZonedTime,
    options: &TimelineOptions,
    uid: &str,
) -> Result<Vec<EventTime>, ParseError> {
    let rrule_str = build_rrule_string(master, rule, start);

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        ParseError::new(format!("event {}: invalid recurrence rule: {}", uid, e))
    })?;

    let result = rrule_set.all(options.max_instances);
    if result.limited {
        warn!(
            uid = %uid,
            limit = options.max_instances,
            "Recurring event truncated at the instance limit"
        );
    }

    Ok(result
        .dates
        .iter()
        .map(|occurrence| occurrence_time(occurrence, start))
        .collect())
}

/// Instance starts of a series defined by RDATE alone: DTSTART first, then
/// every extra date, minus EXDATE.
fn date_instances(
    master: &VEvent,
    start: &ZonedTime,
    options: &TimelineOptions,
    uid: &str,
) -> Vec<EventTime> {
    let excluded: Vec<_> = master
        .exdates
        .iter()
        .map(|e| e.time.to_utc_datetime())
        .collect();

    let mut starts: Vec<EventTime> = std::iter::once(start.time)
        .chain(master.rdates.iter().map(|r| r.time))
        .filter(|t| !excluded.contains(&t.to_utc_datetime()))
        .collect();
    starts.sort_by_key(EventTime::to_utc_datetime);
    starts.dedup_by_key(|t| t.to_utc_datetime());

    let limit = usize::from(options.max_instances);
    if starts.len() > limit {
        warn!(uid = %uid, limit = options.max_instances, "Recurring event truncated at the instance limit");
        starts.truncate(limit);
    }
    starts
}

/// Builds an iCalendar-format rule block for the rrule crate parser.
fn build_rrule_string(master: &VEvent, rule: &str, start: &ZonedTime) -> String {
    let mut lines = vec![
        format!("DTSTART{}", rrule_value(&start.time, start.zone)),
        format!("RRULE:{}", with_utc_until(rule, start)),
    ];

    for rdate in &master.rdates {
        lines.push(format!("RDATE{}", rrule_value(&rdate.time, rdate.zone.or(start.zone))));
    }
    for exdate in &master.exdates {
        lines.push(format!("EXDATE{}", rrule_value(&exdate.time, exdate.zone.or(start.zone))));
    }

    lines.join("\n")
}

/// Rewrites a date or floating `UNTIL` as a UTC date-time.
///
/// The rrule crate requires `UNTIL` in UTC whenever DTSTART is UTC or zoned,
/// which is always the case once [`rrule_value`] has rewritten the start. A
/// date bound covers its whole day. A floating bound is read in the series
/// zone, or as UTC when the series has none, like the start itself.
fn with_utc_until(rule: &str, start: &ZonedTime) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("UNTIL") => {
                match utc_until(value.trim(), start.zone) {
                    Some(until) => format!("{}={}", key, until),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn utc_until(value: &str, zone: Option<Tz>) -> Option<String> {
    if value.ends_with(['Z', 'z']) {
        return None;
    }

    let naive = if value.len() == 8 {
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()?
            .and_hms_opt(23, 59, 59)?
    } else {
        NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?
    };

    let utc = match zone {
        Some(tz) => tz
            .from_local_datetime(&naive)
            .latest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
        None => naive.and_utc(),
    };
    Some(utc.format("%Y%m%dT%H%M%SZ").to_string())
}

/// Formats a value (with its leading `:` or `;TZID=...:`) for the rrule parser.
///
/// The rrule crate needs date-times, so whole-day values become midnight UTC
/// and floating values are read as UTC; [`occurrence_time`] undoes both.
fn rrule_value(time: &EventTime, zone: Option<Tz>) -> String {
    match (time, zone) {
        (EventTime::Date(d), _) => format!(":{}T000000Z", d.format("%Y%m%d")),
        (EventTime::DateTime(dt), Some(tz)) => {
            let local = dt.with_timezone(&tz).naive_local();
            format!(";TZID={}:{}", tz.name(), local.format("%Y%m%dT%H%M%S"))
        }
        (EventTime::DateTime(dt), None) => {
            format!(":{}", dt.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ"))
        }
        (EventTime::Floating(naive), Some(tz)) => {
            format!(";TZID={}:{}", tz.name(), naive.format("%Y%m%dT%H%M%S"))
        }
        (EventTime::Floating(naive), None) => format!(":{}Z", naive.format("%Y%m%dT%H%M%S")),
    }
}

/// Converts an rrule occurrence back to the shape of the series start.
fn occurrence_time(occurrence: &DateTime<rrule::Tz>, start: &ZonedTime) -> EventTime {
    match (&start.time, start.zone) {
        (EventTime::Date(_), _) => EventTime::Date(occurrence.date_naive()),
        (EventTime::DateTime(_), Some(_)) => EventTime::from_fixed(occurrence.fixed_offset()),
        (EventTime::DateTime(dt), None) => EventTime::from_fixed(occurrence.with_timezone(dt.offset())),
        (EventTime::Floating(_), _) => EventTime::Floating(occurrence.naive_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::parse::read_document;

    fn timeline(body: &str) -> Vec<Occurrence> {
        timeline_with(body, &TimelineOptions::default())
    }

    fn timeline_with(body: &str, options: &TimelineOptions) -> Vec<Occurrence> {
        let ics = format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n{}END:VCALENDAR\r\n", body);
        let (_, events) = read_document(&ics).unwrap();
        build_timeline(events, options).unwrap()
    }

    fn starts(occurrences: &[Occurrence]) -> Vec<String> {
        occurrences
            .iter()
            .map(|o| o.start.map(|s| s.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn sorts_by_start() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:late\r\nDTSTART:20240601T090000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:early\r\nDTSTART:20240101T090000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:day\r\nDTSTART;VALUE=DATE:20240301\r\nEND:VEVENT\r\n",
        );
        let uids: Vec<_> = occurrences.iter().map(|o| o.uid.as_deref().unwrap()).collect();
        assert_eq!(uids, vec!["early", "day", "late"]);
    }

    #[test]
    fn equal_starts_keep_document_order() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:b\r\nDTSTART:20240101T090000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:a\r\nDTSTART:20240101T090000Z\r\nEND:VEVENT\r\n",
        );
        let uids: Vec<_> = occurrences.iter().map(|o| o.uid.as_deref().unwrap()).collect();
        assert_eq!(uids, vec!["b", "a"]);
    }

    #[test]
    fn expands_daily_rule_with_duration() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:daily\r\nSUMMARY:Standup\r\n\
             DTSTART:20240101T090000Z\r\nDTEND:20240101T091500Z\r\n\
             RRULE:FREQ=DAILY;COUNT=3\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec![
                "2024-01-01T09:00:00+00:00",
                "2024-01-02T09:00:00+00:00",
                "2024-01-03T09:00:00+00:00",
            ]
        );
        assert_eq!(
            occurrences[2].end.unwrap().to_string(),
            "2024-01-03T09:15:00+00:00"
        );
        assert!(occurrences.iter().all(|o| o.summary.as_deref() == Some("Standup")));
    }

    #[test]
    fn all_day_series_with_date_until() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:w\r\nDTSTART;VALUE=DATE:20240105\r\n\
             RRULE:FREQ=WEEKLY;UNTIL=20240126\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec!["2024-01-05", "2024-01-12", "2024-01-19", "2024-01-26"]
        );
    }

    #[test]
    fn floating_series_with_floating_until() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:f\r\nDTSTART:20240101T090000\r\n\
             RRULE:FREQ=DAILY;UNTIL=20240103T090000\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec!["2024-01-01T09:00:00", "2024-01-02T09:00:00", "2024-01-03T09:00:00"]
        );
    }

    #[test]
    fn zoned_series_with_local_until() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:z\r\nDTSTART;TZID=Europe/Berlin:20240101T100000\r\n\
             RRULE:FREQ=DAILY;UNTIL=20240102T100000\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec!["2024-01-01T10:00:00+01:00", "2024-01-02T10:00:00+01:00"]
        );
    }

    #[test]
    fn utc_until_is_left_alone() {
        let start = ZonedTime {
            time: EventTime::from_date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            zone: None,
        };
        assert_eq!(
            with_utc_until("FREQ=WEEKLY;UNTIL=20240126T000000Z", &start),
            "FREQ=WEEKLY;UNTIL=20240126T000000Z"
        );
        assert_eq!(
            with_utc_until("FREQ=WEEKLY;UNTIL=20240126;BYDAY=FR", &start),
            "FREQ=WEEKLY;UNTIL=20240126T235959Z;BYDAY=FR"
        );
    }

    #[test]
    fn rdate_only_series_keeps_dtstart() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:extra\r\nDTSTART:20240101T090000Z\r\n\
             DTEND:20240101T100000Z\r\nRDATE:20240105T090000Z\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec!["2024-01-01T09:00:00+00:00", "2024-01-05T09:00:00+00:00"]
        );
        assert_eq!(
            occurrences[1].end.unwrap().to_string(),
            "2024-01-05T10:00:00+00:00"
        );
    }

    #[test]
    fn rdate_only_series_honours_exdate() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:extra\r\nDTSTART:20240101T090000Z\r\n\
             RDATE:20240103T090000Z,20240105T090000Z\r\n\
             EXDATE:20240103T090000Z\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec!["2024-01-01T09:00:00+00:00", "2024-01-05T09:00:00+00:00"]
        );
    }

    #[test]
    fn rdate_adds_to_rule() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:mixed\r\nDTSTART:20240101T090000Z\r\n\
             RRULE:FREQ=DAILY;COUNT=2\r\nRDATE:20240110T090000Z\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec![
                "2024-01-01T09:00:00+00:00",
                "2024-01-02T09:00:00+00:00",
                "2024-01-10T09:00:00+00:00",
            ]
        );
    }

    #[test]
    fn exdate_removes_instance() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:daily\r\nDTSTART:20240101T090000Z\r\n\
             RRULE:FREQ=DAILY;COUNT=3\r\nEXDATE:20240102T090000Z\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec!["2024-01-01T09:00:00+00:00", "2024-01-03T09:00:00+00:00"]
        );
        assert!(occurrences.iter().all(|o| o.end.is_none()));
    }

    #[test]
    fn all_day_series_stays_all_day() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:weekly\r\nDTSTART;VALUE=DATE:20240105\r\n\
             DTEND;VALUE=DATE:20240106\r\nRRULE:FREQ=WEEKLY;COUNT=2\r\nEND:VEVENT\r\n",
        );
        assert_eq!(starts(&occurrences), vec!["2024-01-05", "2024-01-12"]);
        assert_eq!(
            occurrences[1].end,
            Some(EventTime::from_date(NaiveDate::from_ymd_opt(2024, 1, 13).unwrap()))
        );
    }

    #[test]
    fn zoned_series_follows_dst() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:tz\r\nDTSTART;TZID=Europe/Berlin:20240325T100000\r\n\
             RRULE:FREQ=WEEKLY;COUNT=2\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            starts(&occurrences),
            vec!["2024-03-25T10:00:00+01:00", "2024-04-01T10:00:00+02:00"]
        );
    }

    #[test]
    fn override_replaces_generated_instance() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:series\r\nSUMMARY:Sync\r\nDTSTART:20240101T090000Z\r\n\
             RRULE:FREQ=DAILY;COUNT=3\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:series\r\nSUMMARY:Moved sync\r\n\
             RECURRENCE-ID:20240102T090000Z\r\nDTSTART:20240102T140000Z\r\nEND:VEVENT\r\n",
        );
        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[1].summary.as_deref(), Some("Moved sync"));
        assert_eq!(
            occurrences[1].start.unwrap().to_string(),
            "2024-01-02T14:00:00+00:00"
        );
    }

    #[test]
    fn override_without_matching_instance_is_kept() {
        let occurrences = timeline(
            "BEGIN:VEVENT\r\nUID:series\r\nDTSTART:20240101T090000Z\r\n\
             RRULE:FREQ=DAILY;COUNT=2\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:series\r\nRECURRENCE-ID:20240110T090000Z\r\n\
             DTSTART:20240110T100000Z\r\nEND:VEVENT\r\n",
        );
        assert_eq!(occurrences.len(), 3);
        assert_eq!(
            occurrences[2].start.unwrap().to_string(),
            "2024-01-10T10:00:00+00:00"
        );
    }

    #[test]
    fn unbounded_rule_is_capped() {
        let options = TimelineOptions::default().with_max_instances(5);
        let occurrences = timeline_with(
            "BEGIN:VEVENT\r\nUID:forever\r\nDTSTART:20240101T090000Z\r\n\
             RRULE:FREQ=DAILY\r\nEND:VEVENT\r\n",
            &options,
        );
        assert_eq!(occurrences.len(), 5);
    }

    #[test]
    fn invalid_rule_is_a_parse_error() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:bad\r\nDTSTART:20240101T090000Z\r\n\
                   RRULE:FREQ=SOMETIMES\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let (_, events) = read_document(ics).unwrap();
        let err = build_timeline(events, &TimelineOptions::default()).unwrap_err();
        assert!(err.message().contains("bad"));
    }
}
