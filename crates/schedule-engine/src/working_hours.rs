//! Working-hours calendar arithmetic.
//!
//! All instants are UTC. Hours and calendar days are interpreted in the
//! configured IANA timezone, so a 09:00–18:00 window in `Europe/Berlin`
//! follows the local clock across DST transitions.
//!
//! A `WorkingHours` value is always valid: `start < end`, both within a day,
//! and at least one working weekday. Deserialization goes through the same
//! validation as [`WorkingHours::new`].

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Raw, unvalidated form used for (de)serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkingHoursSpec {
    #[serde(default = "default_start_hour")]
    start_hour: u32,
    #[serde(default = "default_end_hour")]
    end_hour: u32,
    /// 0 = Sunday .. 6 = Saturday.
    #[serde(default = "default_working_days")]
    working_days: Vec<u8>,
    #[serde(default = "default_timezone")]
    timezone: String,
}

fn default_start_hour() -> u32 {
    9
}

fn default_end_hour() -> u32 {
    18
}

fn default_working_days() -> Vec<u8> {
    vec![1, 2, 3, 4, 5]
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Daily working window plus the set of working weekdays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkingHoursSpec", into = "WorkingHoursSpec")]
pub struct WorkingHours {
    start: NaiveTime,
    end: NaiveTime,
    /// Bit `n` set means weekday `n` (0 = Sunday) is a working day.
    days: u8,
    timezone: Tz,
}

impl WorkingHours {
    /// Build a validated configuration.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidWorkingHours` if an hour is above 23,
    /// `start_hour >= end_hour`, a weekday is above 6, or no weekday is given.
    /// Returns `ScheduleError::InvalidTimezone` if `timezone` is not a valid
    /// IANA identifier.
    pub fn new(start_hour: u32, end_hour: u32, working_days: &[u8], timezone: &str) -> Result<Self> {
        if start_hour >= end_hour {
            return Err(ScheduleError::InvalidWorkingHours(format!(
                "start hour {start_hour} must be before end hour {end_hour}"
            )));
        }
        let hour = |h: u32| {
            if h > 23 {
                return None;
            }
            NaiveTime::from_hms_opt(h, 0, 0)
        };
        let (Some(start), Some(end)) = (hour(start_hour), hour(end_hour)) else {
            return Err(ScheduleError::InvalidWorkingHours(format!(
                "hours must be within 0-23, got {start_hour}-{end_hour}"
            )));
        };

        let mut days = 0u8;
        for &day in working_days {
            if day > 6 {
                return Err(ScheduleError::InvalidWorkingHours(format!(
                    "weekday {day} is out of range 0-6"
                )));
            }
            days |= 1 << day;
        }
        if days == 0 {
            return Err(ScheduleError::InvalidWorkingHours(
                "at least one working day is required".to_string(),
            ));
        }

        let timezone: Tz = timezone
            .parse()
            .map_err(|_| ScheduleError::InvalidTimezone(timezone.to_string()))?;

        Ok(Self {
            start,
            end,
            days,
            timezone,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Working weekdays as numbers, 0 = Sunday.
    pub fn working_days(&self) -> Vec<u8> {
        (0..7).filter(|d| self.days & (1 << d) != 0).collect()
    }

    /// Length of the nominal daily window in minutes.
    pub fn window_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Calendar date of `instant` in the configured timezone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        let day = date.weekday().num_days_from_sunday();
        self.days & (1 << day) != 0
    }

    /// True iff `instant` falls on a working weekday within `[start, end)`.
    pub fn is_working_time(&self, instant: DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.timezone);
        let time = local.time();
        self.is_working_day(local.date_naive()) && time >= self.start && time < self.end
    }

    /// Smallest working instant at or after `instant`.
    ///
    /// Before the window on a working day snaps to that day's start. At or after
    /// the window, or on a non-working day, moves to the start of the next
    /// working day (at most seven days ahead).
    pub fn next_working_instant(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let local = instant.with_timezone(&self.timezone);
        let today = local.date_naive();
        if self.is_working_day(today) {
            let time = local.time();
            if time < self.start {
                return self.day_start(today);
            }
            if time < self.end {
                return instant;
            }
        }
        self.day_start(self.next_working_date_after(today))
    }

    /// Working-window boundaries for the local calendar day containing `instant`.
    pub fn day_window(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        self.day_window_on(self.local_date(instant))
    }

    /// Working-window boundaries for a calendar date.
    pub fn day_window_on(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.day_start(date), self.resolve_local(date.and_time(self.end)))
    }

    /// Scan cursors: the next working instant, then each following working
    /// day's start. Infinite; callers bound it.
    pub fn working_days_from(
        &self,
        instant: DateTime<Utc>,
    ) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        std::iter::successors(Some(self.next_working_instant(instant)), move |cursor| {
            let date = self.local_date(*cursor);
            Some(self.day_start(self.next_working_date_after(date)))
        })
    }

    fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_local(date.and_time(self.start))
    }

    fn next_working_date_after(&self, date: NaiveDate) -> NaiveDate {
        // The weekday mask is never empty, so a hit comes within a week.
        (1..=7)
            .map(|n| date + Duration::days(n))
            .find(|d| self.is_working_day(*d))
            .unwrap_or(date + Duration::days(7))
    }

    /// Local wall-clock time to UTC. Ambiguous times take the earlier instant;
    /// times inside a DST gap move forward one hour.
    fn resolve_local(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                self.timezone
                    .from_local_datetime(&(naive + Duration::hours(1)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

impl Default for WorkingHours {
    /// 09:00–18:00, Monday to Friday, UTC.
    fn default() -> Self {
        Self {
            start: NaiveTime::MIN + Duration::hours(9),
            end: NaiveTime::MIN + Duration::hours(18),
            days: 0b0011_1110,
            timezone: Tz::UTC,
        }
    }
}

impl TryFrom<WorkingHoursSpec> for WorkingHours {
    type Error = ScheduleError;

    fn try_from(spec: WorkingHoursSpec) -> Result<Self> {
        Self::new(
            spec.start_hour,
            spec.end_hour,
            &spec.working_days,
            &spec.timezone,
        )
    }
}

impl From<WorkingHours> for WorkingHoursSpec {
    fn from(hours: WorkingHours) -> Self {
        Self {
            start_hour: hours.start.hour(),
            end_hour: hours.end.hour(),
            working_days: hours.working_days(),
            timezone: hours.timezone.name().to_string(),
        }
    }
}
