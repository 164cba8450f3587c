//! Recurring calendar events as concrete busy time.
//!
//! Providers hand recurring meetings over as an RFC 5545 RRULE plus a local
//! start time. They are expanded here (via the `rrule` crate, with `chrono-tz`
//! for DST) into individual [`ExternalEvent`]s the scheduler can route around.
//! A date-only `dtstart` produces all-day occurrences.

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::busy::{BusyInterval, ExternalEvent};
use crate::error::{Result, ScheduleError};

/// Expansion cap when neither `count` nor COUNT limits the rule.
const DEFAULT_MAX_INSTANCES: u16 = 500;

/// A recurring event as received from a calendar provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// e.g. "FREQ=WEEKLY;BYDAY=TU,TH"
    pub rrule: String,
    /// Local start, "2026-02-17T14:00:00", or a bare date for all-day events.
    pub dtstart: String,
    #[serde(default)]
    pub duration_minutes: u32,
    /// IANA timezone of `dtstart`, `until` and `exdates`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Occurrences to drop, same format as `dtstart`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exdates: Vec<String>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Recurrence {
    pub fn new(rrule: impl Into<String>, dtstart: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            title: None,
            rrule: rrule.into(),
            dtstart: dtstart.into(),
            duration_minutes,
            timezone: default_timezone(),
            until: None,
            count: None,
            exdates: Vec::new(),
        }
    }

    pub fn in_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn all_day(&self) -> bool {
        !self.dtstart.contains('T')
    }
}

/// Expand one recurrence into its occurrences.
///
/// # Errors
/// Returns `ScheduleError::InvalidRule` if the RRULE is empty or unparseable,
/// or if a timed recurrence has a zero duration.
/// Returns `ScheduleError::InvalidTimezone` if the timezone is not a valid IANA
/// identifier.
pub fn expand_recurrence(recurrence: &Recurrence) -> Result<Vec<ExternalEvent>> {
    if recurrence.rrule.is_empty() {
        return Err(ScheduleError::InvalidRule("empty RRULE string".to_string()));
    }
    let all_day = recurrence.all_day();
    if !all_day && recurrence.duration_minutes == 0 {
        return Err(ScheduleError::InvalidRule(
            "timed recurrence needs a positive duration".to_string(),
        ));
    }
    if recurrence.count == Some(0) {
        return Ok(Vec::new());
    }

    let tz: chrono_tz::Tz = recurrence
        .timezone
        .parse()
        .map_err(|_| ScheduleError::InvalidTimezone(recurrence.timezone.clone()))?;

    let rrule_set: RRuleSet = ical_text(recurrence)
        .parse()
        .map_err(|e| ScheduleError::InvalidRule(format!("{}", e)))?;

    // `.all(limit)` caps before EXDATE filtering, so leave room for excluded
    // instances and truncate afterwards.
    let exdate_buffer = u16::try_from(recurrence.exdates.len()).unwrap_or(u16::MAX);
    let limit = recurrence
        .count
        .map(|c| u16::try_from(c).unwrap_or(u16::MAX).saturating_add(exdate_buffer))
        .unwrap_or(DEFAULT_MAX_INSTANCES);

    let duration = Duration::minutes(i64::from(recurrence.duration_minutes));
    let mut events: Vec<ExternalEvent> = rrule_set
        .all(limit)
        .dates
        .into_iter()
        .map(|dt| {
            let event = if all_day {
                ExternalEvent::all_day(dt.with_timezone(&tz).date_naive())
            } else {
                let start: DateTime<Utc> = dt.with_timezone(&Utc);
                ExternalEvent::timed(start, start + duration)
            };
            match &recurrence.title {
                Some(title) => event.with_title(title.clone()),
                None => event,
            }
        })
        .collect();

    if let Some(c) = recurrence.count {
        events.truncate(c as usize);
    }

    Ok(events)
}

/// Expand several recurrences straight into busy intervals.
///
/// # Errors
/// The first expansion error encountered.
pub fn expand_to_busy(recurrences: &[Recurrence]) -> Result<Vec<BusyInterval>> {
    let mut busy = Vec::new();
    for recurrence in recurrences {
        busy.extend(
            expand_recurrence(recurrence)?
                .into_iter()
                .map(BusyInterval::Fixed),
        );
    }
    Ok(busy)
}

/// Build the iCalendar block (DTSTART, RRULE, optional EXDATE) for `rrule`.
fn ical_text(recurrence: &Recurrence) -> String {
    let tz = recurrence.timezone.as_str();
    let mut rule = recurrence.rrule.clone();

    if let Some(c) = recurrence.count {
        if !rule.to_uppercase().contains("COUNT=") {
            rule = format!("{};COUNT={}", rule, c);
        }
    }

    // UNTIL must share DTSTART's timezone; UTC needs the trailing "Z".
    if let Some(until) = &recurrence.until {
        if !rule.to_uppercase().contains("UNTIL=") {
            let mut until_ical = to_ical(until);
            if tz == "UTC" {
                until_ical.push('Z');
            }
            rule = format!("{};UNTIL={}", rule, until_ical);
        }
    }

    let mut text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        tz,
        to_ical(&recurrence.dtstart),
        rule
    );

    if !recurrence.exdates.is_empty() {
        let exdates: Vec<String> = recurrence.exdates.iter().map(|d| to_ical(d)).collect();
        text.push_str(&format!("\nEXDATE;TZID={}:{}", tz, exdates.join(",")));
    }

    text
}

/// "2026-02-17T14:00:00" -> "20260217T140000"; bare dates get midnight.
fn to_ical(local: &str) -> String {
    let compact = local.replace(['-', ':'], "");
    if compact.contains('T') {
        compact
    } else {
        format!("{}T000000", compact)
    }
}
