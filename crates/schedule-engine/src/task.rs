//! Tasks as the scheduler sees them: duration, deadline, priority.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::freebusy::TimeSlot;

/// Task priority. Urgent is the most important level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Scheduling order: 0 for Urgent through 3 for Low.
    pub fn rank(self) -> u8 {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Importance weight: 4 for Urgent through 1 for Low.
    pub fn weight(self) -> u8 {
        4 - self.rank()
    }

    /// True when `self` is equal to or more important than `other`.
    pub fn is_at_least(self, other: Priority) -> bool {
        self.weight() >= other.weight()
    }

    /// Urgent and High work takes the earliest opportunity.
    pub fn is_expedited(self) -> bool {
        matches!(self, Self::Urgent | Self::High)
    }
}

/// Lifecycle status. Only `Completed` affects scheduling: such tasks are
/// left out of batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

/// A unit of work to place on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within the caller's scope.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Required time in minutes. Must be positive.
    pub duration_minutes: u32,
    /// The placed interval must end by this instant whenever possible.
    pub deadline: DateTime<Utc>,
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    /// A previously persisted placement, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<TimeSlot>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        duration_minutes: u32,
        deadline: DateTime<Utc>,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            duration_minutes,
            deadline,
            priority,
            status: TaskStatus::NotStarted,
            scheduled: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgent_outranks_everything() {
        for other in [Priority::High, Priority::Medium, Priority::Low] {
            assert!(Priority::Urgent.is_at_least(other));
            assert!(!other.is_at_least(Priority::Urgent));
        }
        assert!(Priority::Medium.is_at_least(Priority::Medium));
    }

    #[test]
    fn only_urgent_and_high_are_expedited() {
        assert!(Priority::Urgent.is_expedited());
        assert!(Priority::High.is_expedited());
        assert!(!Priority::Medium.is_expedited());
        assert!(!Priority::Low.is_expedited());
    }

    #[test]
    fn status_defaults_when_missing() {
        let json = r#"{
            "id": "t1",
            "name": "Write report",
            "duration_minutes": 45,
            "deadline": "2026-03-20T17:00:00Z",
            "priority": "HIGH"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.duration(), Duration::minutes(45));
    }
}
