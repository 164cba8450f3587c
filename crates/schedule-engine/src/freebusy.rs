//! Compute free time slots inside working hours.
//!
//! Collects the busy intervals that touch the window, sorts them by start, and
//! walks a cursor across the window emitting the gaps. Busy intervals may
//! overlap each other; the cursor only ever moves forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::busy::BusyInterval;
use crate::working_hours::WorkingHours;

/// A half-open time range `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Returns `None` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Two slots overlap when `a.start < b.end && b.start < a.end`.
    /// Adjacent slots (one ends exactly when the other starts) do not.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Gaps of at least `min_duration_minutes` between busy intervals inside
/// `[window_start, window_end)`.
///
/// All-day events are ignored. Returns slots sorted by start time.
pub fn find_free_slots(
    busy: &[BusyInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_duration_minutes: i64,
) -> Vec<TimeSlot> {
    let mut spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = busy
        .iter()
        .filter_map(BusyInterval::span)
        .filter(|&(start, end)| start < window_end && end > window_start)
        .collect();
    spans.sort_by_key(|&(start, end)| (start, end));

    let mut slots = Vec::new();
    let mut cursor = window_start;
    let mut push_gap = |start: DateTime<Utc>, end: DateTime<Utc>| {
        if let Some(slot) = TimeSlot::new(start, end) {
            if slot.duration_minutes() >= min_duration_minutes {
                slots.push(slot);
            }
        }
    };

    for (busy_start, busy_end) in spans {
        push_gap(cursor, busy_start);
        cursor = cursor.max(busy_end);
    }

    // Trailing free slot after the last busy period.
    push_gap(cursor, window_end);

    slots
}

/// Free slots within the working hours of the local day containing `day`.
///
/// Every returned slot lies inside that day's working window and lasts at
/// least `min_duration_minutes`. With no busy time on the day the whole window
/// comes back as one slot.
pub fn find_daily_slots(
    hours: &WorkingHours,
    day: DateTime<Utc>,
    busy: &[BusyInterval],
    min_duration_minutes: i64,
) -> Vec<TimeSlot> {
    let (day_start, day_end) = hours.day_window(day);
    find_free_slots(busy, day_start, day_end, min_duration_minutes)
}
