//! Place a single task.
//!
//! The scheduler walks forward one working day at a time from `now`, asks the
//! slot finder for the day's gaps, and takes the first candidate that is free
//! of blocking busy time and ends by the deadline. If no such candidate exists
//! the deadline turns advisory: the scan resumes on the deadline's own day
//! (or at `now`, if that is later) without the deadline bound, and the result
//! is flagged as late. That second scan is bounded by
//! [`SchedulerConfig::max_lookahead_days`], counted from where it resumes.
//!
//! `now` is always passed in; nothing here reads the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::busy::{BusyInterval, PlacedTask};
use crate::conflict::has_conflict;
use crate::error::{Result, ScheduleError};
use crate::freebusy::{find_daily_slots, TimeSlot};
use crate::task::{Priority, Task};
use crate::working_hours::WorkingHours;

/// Scheduler-wide settings. Read-only after startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub working_hours: WorkingHours,
    /// Smallest gap worth listing as free time.
    #[serde(default = "default_min_slot_minutes")]
    pub min_slot_minutes: i64,
    /// How many working days the past-deadline scan may look ahead.
    #[serde(default = "default_max_lookahead_days")]
    pub max_lookahead_days: u32,
}

fn default_min_slot_minutes() -> i64 {
    30
}

fn default_max_lookahead_days() -> u32 {
    365
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            working_hours: WorkingHours::default(),
            min_slot_minutes: default_min_slot_minutes(),
            max_lookahead_days: default_max_lookahead_days(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_working_hours(working_hours: WorkingHours) -> Self {
        Self {
            working_hours,
            ..Self::default()
        }
    }
}

/// Where a task ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub task_id: String,
    pub priority: Priority,
    pub slot: TimeSlot,
    /// False when no slot before the deadline existed and the task was
    /// placed after it.
    pub deadline_met: bool,
}

impl Placement {
    /// This placement as busy time for tasks scheduled after it.
    pub fn to_busy(&self) -> BusyInterval {
        BusyInterval::Placed(PlacedTask {
            task_id: self.task_id.clone(),
            priority: self.priority,
            slot: self.slot,
        })
    }
}

/// Reject tasks that can never be placed in one piece.
///
/// # Errors
/// `ScheduleError::ZeroDuration` for a zero duration,
/// `ScheduleError::InfeasibleDuration` when the duration exceeds the daily
/// working window.
pub fn check_feasible(task: &Task, hours: &WorkingHours) -> Result<()> {
    if task.duration_minutes == 0 {
        return Err(ScheduleError::ZeroDuration(task.id.clone()));
    }
    let window_minutes = hours.window_minutes();
    if i64::from(task.duration_minutes) > window_minutes {
        return Err(ScheduleError::InfeasibleDuration {
            task_id: task.id.clone(),
            duration_minutes: task.duration_minutes,
            window_minutes,
        });
    }
    Ok(())
}

/// Place `task` around `busy`, starting no earlier than `now`.
///
/// Urgent and High tasks take the earliest opportunity; Medium and Low take
/// the first opportunity that respects the deadline. No backtracking and no
/// global optimization: the first feasible candidate wins.
///
/// # Errors
/// Precondition failures from [`check_feasible`], or
/// `ScheduleError::NoConflictFreeSlot` if the calendar is blocked for the
/// whole lookahead.
pub fn schedule_task(
    task: &Task,
    busy: &[BusyInterval],
    config: &SchedulerConfig,
    now: DateTime<Utc>,
) -> Result<Placement> {
    let hours = &config.working_hours;
    check_feasible(task, hours)?;

    let blocking = blocking_for(task.priority, busy);

    let on_time = hours
        .working_days_from(now)
        .take_while(|cursor| *cursor < task.deadline)
        .flat_map(|cursor| day_candidates(task, &blocking, hours, cursor))
        .find(|candidate| candidate.end <= task.deadline);

    if let Some(slot) = on_time {
        tracing::debug!(
            task_id = %task.id,
            expedited = task.priority.is_expedited(),
            start = %slot.start,
            end = %slot.end,
            "task placed"
        );
        return Ok(placement(task, slot));
    }

    // Days before the deadline's own day were all rejected above.
    let (deadline_day_start, _) = hours.day_window(task.deadline);
    let lookahead = config.max_lookahead_days;
    let late = hours
        .working_days_from(now.max(deadline_day_start))
        .take(lookahead as usize)
        .flat_map(|cursor| day_candidates(task, &blocking, hours, cursor))
        .next();

    match late {
        Some(slot) => {
            tracing::warn!(
                task_id = %task.id,
                deadline = %task.deadline,
                start = %slot.start,
                "no slot before deadline, placed late"
            );
            Ok(placement(task, slot))
        }
        None => Err(ScheduleError::NoConflictFreeSlot {
            task_id: task.id.clone(),
            lookahead_days: lookahead,
        }),
    }
}

/// Alternative slots for `task` that end by its deadline, closest to the
/// latest possible start (`deadline - duration`) first. One candidate per
/// free gap, at most `max` of them.
///
/// # Errors
/// Precondition failures from [`check_feasible`].
pub fn suggest_alternatives(
    task: &Task,
    busy: &[BusyInterval],
    config: &SchedulerConfig,
    now: DateTime<Utc>,
    max: usize,
) -> Result<Vec<TimeSlot>> {
    let hours = &config.working_hours;
    check_feasible(task, hours)?;

    let blocking = blocking_for(task.priority, busy);
    let latest_start = task.deadline - task.duration();

    let mut options: Vec<TimeSlot> = hours
        .working_days_from(now)
        .take(config.max_lookahead_days as usize)
        .take_while(|cursor| *cursor < task.deadline)
        .flat_map(|cursor| day_candidates(task, &blocking, hours, cursor))
        .filter(|candidate| candidate.end <= task.deadline)
        .collect();

    options.sort_by_key(|slot| ((slot.start - latest_start).num_seconds().abs(), slot.start));
    options.truncate(max);
    Ok(options)
}

fn blocking_for(priority: Priority, busy: &[BusyInterval]) -> Vec<BusyInterval> {
    busy.iter().filter(|b| b.blocks(priority)).cloned().collect()
}

/// Conflict-free candidates of exactly the task's duration on the day of
/// `cursor`, none starting before `cursor`, in time order.
fn day_candidates<'a>(
    task: &'a Task,
    blocking: &'a [BusyInterval],
    hours: &WorkingHours,
    cursor: DateTime<Utc>,
) -> impl Iterator<Item = TimeSlot> + 'a {
    let duration = task.duration();
    find_daily_slots(hours, cursor, blocking, i64::from(task.duration_minutes))
        .into_iter()
        .filter_map(move |slot| {
            let start = slot.start.max(cursor);
            let candidate = TimeSlot::new(start, start + duration)?;
            (candidate.end <= slot.end).then_some(candidate)
        })
        .filter(move |candidate| !has_conflict(candidate, blocking, task.priority))
}

fn placement(task: &Task, slot: TimeSlot) -> Placement {
    Placement {
        task_id: task.id.clone(),
        priority: task.priority,
        slot,
        deadline_met: slot.end <= task.deadline,
    }
}
