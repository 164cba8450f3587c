//! Error types for schedule-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid working hours: {0}")]
    InvalidWorkingHours(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The task needs more minutes than any single working day offers.
    /// Rejected before scheduling; the scheduler never splits a task.
    #[error(
        "Task {task_id} needs {duration_minutes} minutes but a working day only has {window_minutes}"
    )]
    InfeasibleDuration {
        task_id: String,
        duration_minutes: u32,
        window_minutes: i64,
    },

    #[error("Task {0} has a zero duration")]
    ZeroDuration(String),

    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("No conflict-free slot for task {task_id} within {lookahead_days} working days")]
    NoConflictFreeSlot {
        task_id: String,
        lookahead_days: u32,
    },

    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
