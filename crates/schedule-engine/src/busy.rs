//! Busy time the scheduler must route around.
//!
//! A busy interval is either a fixed external event (meetings, calendar
//! blocks, anything synced from a provider) or a task that has already been
//! placed. Fixed events always block. Placed tasks block only work of equal
//! or lower priority, so urgent work may land on top of a low-priority
//! placement but never on top of a meeting.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::freebusy::TimeSlot;
use crate::task::Priority;

/// When an external event happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    Timed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Date-only events. They never block slot placement.
    AllDay { date: NaiveDate },
}

/// An event from the user's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub time: EventTime,
}

impl ExternalEvent {
    pub fn timed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            title: None,
            time: EventTime::Timed { start, end },
        }
    }

    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            title: None,
            time: EventTime::AllDay { date },
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A task already placed on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedTask {
    pub task_id: String,
    pub priority: Priority,
    pub slot: TimeSlot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusyInterval {
    Fixed(ExternalEvent),
    Placed(PlacedTask),
}

impl BusyInterval {
    /// The `[start, end)` range this interval occupies, or `None` for all-day
    /// events and for timed events that do not end after they start. Neither
    /// takes part in placement.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self {
            Self::Fixed(ExternalEvent {
                time: EventTime::Timed { start, end },
                ..
            }) => (start < end).then_some((*start, *end)),
            Self::Fixed(ExternalEvent {
                time: EventTime::AllDay { .. },
                ..
            }) => None,
            Self::Placed(placed) => Some((placed.slot.start, placed.slot.end)),
        }
    }

    /// Whether this interval keeps work of the given priority out.
    ///
    /// All-day and empty events never block. Other fixed events always do.
    /// Placed tasks block work that is not strictly more important than they
    /// are.
    pub fn blocks(&self, priority: Priority) -> bool {
        match self {
            Self::Fixed(_) => self.span().is_some(),
            Self::Placed(placed) => placed.priority.is_at_least(priority),
        }
    }

    /// True if this interval occupies time inside `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.span()
            .is_some_and(|(busy_start, busy_end)| start < busy_end && busy_start < end)
    }
}

impl From<ExternalEvent> for BusyInterval {
    fn from(event: ExternalEvent) -> Self {
        Self::Fixed(event)
    }
}

impl From<PlacedTask> for BusyInterval {
    fn from(placed: PlacedTask) -> Self {
        Self::Placed(placed)
    }
}
