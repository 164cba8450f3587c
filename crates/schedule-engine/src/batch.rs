//! Schedule many tasks in one pass.
//!
//! Tasks are ordered by priority, then deadline, then duration, and placed one
//! after another. Each placement becomes busy time for the tasks after it,
//! tagged with its own priority.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::busy::BusyInterval;
use crate::error::{Result, ScheduleError};
use crate::freebusy::TimeSlot;
use crate::scheduler::{check_feasible, schedule_task, Placement, SchedulerConfig};
use crate::task::Task;
use crate::working_hours::WorkingHours;

/// Result of a batch run, keyed by task id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    placements: BTreeMap<String, Placement>,
}

impl Schedule {
    pub fn get(&self, task_id: &str) -> Option<&Placement> {
        self.placements.get(task_id)
    }

    pub fn slot(&self, task_id: &str) -> Option<TimeSlot> {
        self.get(task_id).map(|p| p.slot)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    /// Placements that could not meet their deadline. Callers surface these
    /// as warnings.
    pub fn late(&self) -> impl Iterator<Item = &Placement> {
        self.iter().filter(|p| !p.deadline_met)
    }

    /// Task id to slot, the shape persistence layers store.
    pub fn slots(&self) -> BTreeMap<&str, TimeSlot> {
        self.placements
            .iter()
            .map(|(id, p)| (id.as_str(), p.slot))
            .collect()
    }
}

impl IntoIterator for Schedule {
    type Item = (String, Placement);
    type IntoIter = std::collections::btree_map::IntoIter<String, Placement>;

    fn into_iter(self) -> Self::IntoIter {
        self.placements.into_iter()
    }
}

/// Order tasks for placement: Urgent first, then earlier deadline, then
/// shorter duration.
pub fn sort_for_scheduling(tasks: &mut [&Task]) {
    tasks.sort_by_key(|t| (t.priority.rank(), t.deadline, t.duration_minutes));
}

/// Place every task that is not completed.
///
/// All tasks are validated before any is placed, so a failure never leaves a
/// half-built schedule behind.
///
/// # Errors
/// `ScheduleError::DuplicateTask` for repeated ids, precondition failures from
/// [`check_feasible`], or `ScheduleError::NoConflictFreeSlot` from the
/// single-task scheduler.
pub fn schedule_batch(
    tasks: &[Task],
    busy: &[BusyInterval],
    config: &SchedulerConfig,
    now: DateTime<Utc>,
) -> Result<Schedule> {
    let mut pending: Vec<&Task> = tasks.iter().filter(|t| !t.is_completed()).collect();

    let mut seen = HashSet::new();
    for task in &pending {
        if !seen.insert(task.id.as_str()) {
            return Err(ScheduleError::DuplicateTask(task.id.clone()));
        }
        check_feasible(task, &config.working_hours)?;
    }

    sort_for_scheduling(&mut pending);

    let mut accumulated = busy.to_vec();
    let mut schedule = Schedule::default();
    for task in pending {
        let placement = schedule_task(task, &accumulated, config, now)?;
        accumulated.push(placement.to_busy());
        schedule.placements.insert(task.id.clone(), placement);
    }

    tracing::info!(
        placed = schedule.len(),
        late = schedule.late().count(),
        "batch scheduling finished"
    );
    Ok(schedule)
}

/// True iff `last_run` falls on an earlier local calendar day than `now`.
pub fn needs_rescheduling(
    last_run: DateTime<Utc>,
    now: DateTime<Utc>,
    hours: &WorkingHours,
) -> bool {
    hours.local_date(last_run) < hours.local_date(now)
}
