//! Decide whether a candidate placement is blocked, and audit existing ones.
//!
//! Overlap is the half-open test `a.start < b.end && b.start < a.end`, so
//! adjacent intervals (one ends exactly when another starts) are NOT
//! conflicts. Whether an overlap counts depends on what is being overlapped:
//! see [`BusyInterval::blocks`].

use serde::Serialize;

use crate::busy::{BusyInterval, PlacedTask};
use crate::freebusy::TimeSlot;
use crate::task::{Priority, Task};

/// True iff some busy interval that blocks `priority` overlaps `candidate`.
pub fn has_conflict(candidate: &TimeSlot, busy: &[BusyInterval], priority: Priority) -> bool {
    busy.iter()
        .any(|b| b.blocks(priority) && b.overlaps(candidate.start, candidate.end))
}

/// A placed task that overlaps something it should not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub task_id: String,
    pub slot: TimeSlot,
    pub blocker: BusyInterval,
    pub overlap_minutes: i64,
}

/// Find every pair (placed task, busy interval) where the busy interval blocks
/// the task's priority and the two overlap.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
/// A placed task is never reported against its own busy entry.
pub fn find_conflicts(placed: &[PlacedTask], busy: &[BusyInterval]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for task in placed {
        for blocker in busy {
            if let BusyInterval::Placed(other) = blocker {
                if other.task_id == task.task_id {
                    continue;
                }
            }
            if !blocker.blocks(task.priority) {
                continue;
            }
            let Some((busy_start, busy_end)) = blocker.span() else {
                continue;
            };
            if task.slot.start < busy_end && busy_start < task.slot.end {
                let overlap_start = task.slot.start.max(busy_start);
                let overlap_end = task.slot.end.min(busy_end);

                conflicts.push(Conflict {
                    task_id: task.task_id.clone(),
                    slot: task.slot,
                    blocker: blocker.clone(),
                    overlap_minutes: (overlap_end - overlap_start).num_minutes(),
                });
            }
        }
    }

    conflicts
}

/// Check the persisted placements of `tasks` against fresh busy time, e.g.
/// after a calendar sync, and against each other. Tasks without a placement
/// and completed tasks are skipped.
pub fn audit_scheduled(tasks: &[Task], busy: &[BusyInterval]) -> Vec<Conflict> {
    let placed: Vec<PlacedTask> = tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter_map(|t| {
            t.scheduled.map(|slot| PlacedTask {
                task_id: t.id.clone(),
                priority: t.priority,
                slot,
            })
        })
        .collect();

    let mut all_busy = busy.to_vec();
    all_busy.extend(placed.iter().cloned().map(BusyInterval::Placed));

    find_conflicts(&placed, &all_busy)
}
