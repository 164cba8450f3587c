//! # schedule-engine
//!
//! Deterministic task placement for a personal calendar assistant.
//!
//! Given tasks (duration, deadline, priority) and the busy time already on a
//! calendar, the engine assigns every task a concrete start and end inside
//! working hours. Urgent work goes first and takes the earliest opening;
//! everything is placed without overlapping meetings or more important work.
//! The current instant is always an argument, so every result is reproducible.
//!
//! ## Modules
//!
//! - [`working_hours`] — working-time predicate, next working instant, day windows
//! - [`freebusy`] — free slots inside one day's working hours
//! - [`conflict`] — priority-aware conflict checks and schedule audits
//! - [`scheduler`] — place a single task
//! - [`batch`] — order and place many tasks, rescheduling trigger
//! - [`busy`] — fixed events vs. placed tasks
//! - [`expander`] — RRULE recurrences → concrete busy time
//! - [`task`] — tasks, priorities, statuses
//! - [`error`] — Error types

pub mod batch;
pub mod busy;
pub mod conflict;
pub mod error;
pub mod expander;
pub mod freebusy;
pub mod scheduler;
pub mod task;
pub mod working_hours;

pub use batch::{needs_rescheduling, schedule_batch, sort_for_scheduling, Schedule};
pub use busy::{BusyInterval, EventTime, ExternalEvent, PlacedTask};
pub use conflict::{audit_scheduled, find_conflicts, has_conflict, Conflict};
pub use error::ScheduleError;
pub use expander::{expand_recurrence, expand_to_busy, Recurrence};
pub use freebusy::{find_daily_slots, find_free_slots, TimeSlot};
pub use scheduler::{
    check_feasible, schedule_task, suggest_alternatives, Placement, SchedulerConfig,
};
pub use task::{Priority, Task, TaskStatus};
pub use working_hours::WorkingHours;
