//! Property-based tests for slot finding, conflict checks and placement.
//!
//! These verify laws that should hold for *any* calendar, not just the
//! hand-picked examples in the other test files.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use schedule_engine::{
    find_daily_slots, has_conflict, schedule_batch, schedule_task, BusyInterval, ExternalEvent,
    PlacedTask, Priority, SchedulerConfig, Task, TimeSlot, WorkingHours,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Monday 2026-03-16 00:00 UTC.
fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap()
}

fn minutes(m: i64) -> DateTime<Utc> {
    monday() + Duration::minutes(m)
}

/// A slot somewhere in the first week, 1-480 minutes long.
fn arb_slot() -> impl Strategy<Value = TimeSlot> {
    (0i64..7 * 1440, 1i64..=480)
        .prop_map(|(start, len)| TimeSlot::new(minutes(start), minutes(start + len)).unwrap())
}

/// Possibly overlapping meetings across the first week.
fn arb_busy() -> impl Strategy<Value = Vec<BusyInterval>> {
    prop::collection::vec(arb_slot(), 0..12).prop_map(|slots| {
        slots
            .into_iter()
            .map(|s| ExternalEvent::timed(s.start, s.end).into())
            .collect()
    })
}

/// Meetings mixed with earlier placements of any priority.
fn arb_mixed_busy() -> impl Strategy<Value = Vec<BusyInterval>> {
    prop::collection::vec((arb_slot(), prop::option::of(arb_priority())), 0..12).prop_map(
        |items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (slot, priority))| match priority {
                    Some(priority) => BusyInterval::from(PlacedTask {
                        task_id: format!("placed-{i}"),
                        priority,
                        slot,
                    }),
                    None => BusyInterval::from(ExternalEvent::timed(slot.start, slot.end)),
                })
                .collect()
        },
    )
}

/// Disjoint meetings on Monday, built from sorted distinct cut points.
fn arb_disjoint_day_busy() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::btree_set(0i64..1440, 0..16).prop_map(|points| {
        let points: Vec<i64> = points.into_iter().collect();
        points.chunks_exact(2).map(|p| (p[0], p[1])).collect()
    })
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Urgent),
        Just(Priority::High),
        Just(Priority::Medium),
        Just(Priority::Low),
    ]
}

fn arb_task() -> impl Strategy<Value = Task> {
    (1u32..=540, 0i64..14 * 1440, arb_priority()).prop_map(|(dur, deadline, priority)| {
        Task::new("t", "Task", dur, minutes(deadline), priority)
    })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: Overlap is symmetric and reflexive
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn overlap_is_symmetric_and_reflexive(a in arb_slot(), b in arb_slot()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        prop_assert!(a.overlaps(&a));
    }
}

// ---------------------------------------------------------------------------
// Property 2: Daily slots respect the minimum and the working window
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn daily_slots_are_long_enough_and_inside_the_window(
        busy in arb_busy(),
        min in 1i64..=240,
        day in 0i64..7,
    ) {
        let hours = WorkingHours::default();
        let probe = minutes(day * 1440 + 600);
        let (day_start, day_end) = hours.day_window(probe);

        for slot in find_daily_slots(&hours, probe, &busy, min) {
            prop_assert!(slot.duration_minutes() >= min, "{:?} shorter than {}", slot, min);
            prop_assert!(slot.start >= day_start && slot.end <= day_end, "{:?} outside window", slot);
            prop_assert!(!has_conflict(&slot, &busy, Priority::Urgent), "{:?} overlaps busy time", slot);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: Slots and disjoint busy time tile the window exactly once
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_and_busy_cover_the_window(cuts in arb_disjoint_day_busy()) {
        let hours = WorkingHours::default();
        let busy: Vec<BusyInterval> = cuts
            .iter()
            .map(|&(s, e)| ExternalEvent::timed(minutes(s), minutes(e)).into())
            .collect();
        let (day_start, day_end) = hours.day_window(monday());

        let free: i64 = find_daily_slots(&hours, monday(), &busy, 0)
            .iter()
            .map(TimeSlot::duration_minutes)
            .sum();
        let occupied: i64 = cuts
            .iter()
            .map(|&(s, e)| {
                let start = minutes(s).max(day_start);
                let end = minutes(e).min(day_end);
                (end - start).num_minutes().max(0)
            })
            .sum();

        prop_assert_eq!(free + occupied, (day_end - day_start).num_minutes());
    }
}

// ---------------------------------------------------------------------------
// Property 4: Placement keeps the exact duration and avoids blocking time
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn placement_has_exact_duration_and_no_conflict(
        task in arb_task(),
        busy in arb_busy(),
        now in 0i64..7 * 1440,
    ) {
        let cfg = SchedulerConfig::default();
        let placement = schedule_task(&task, &busy, &cfg, minutes(now)).unwrap();

        prop_assert_eq!(placement.slot.duration_minutes(), i64::from(task.duration_minutes));
        prop_assert!(placement.slot.start >= minutes(now));
        prop_assert!(!has_conflict(&placement.slot, &busy, task.priority));
        prop_assert!(cfg.working_hours.is_working_time(placement.slot.start));
        if placement.deadline_met {
            prop_assert!(placement.slot.end <= task.deadline);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: Batch placements never overlap each other
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn batch_placements_are_pairwise_disjoint(
        specs in prop::collection::vec((1u32..=180, 0i64..10 * 1440, arb_priority()), 1..8),
        busy in arb_busy(),
    ) {
        let tasks: Vec<Task> = specs
            .iter()
            .enumerate()
            .map(|(i, &(dur, deadline, priority))| {
                Task::new(format!("t{i}"), "Task", dur, minutes(deadline), priority)
            })
            .collect();

        let schedule = schedule_batch(&tasks, &busy, &SchedulerConfig::default(), monday()).unwrap();

        prop_assert_eq!(schedule.len(), tasks.len());
        let placed: Vec<_> = schedule.iter().collect();
        for (i, a) in placed.iter().enumerate() {
            prop_assert!(!has_conflict(&a.slot, &busy, a.priority));
            for b in &placed[i + 1..] {
                prop_assert!(!a.slot.overlaps(&b.slot), "{} overlaps {}", a.task_id, b.task_id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 6: Placements respect meetings and equal-or-higher placed work
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn placement_never_overlaps_equal_or_higher_priority_work(
        task in arb_task(),
        busy in arb_mixed_busy(),
        now in 0i64..7 * 1440,
    ) {
        let placement = schedule_task(&task, &busy, &SchedulerConfig::default(), minutes(now)).unwrap();

        for interval in &busy {
            let overlaps = interval.overlaps(placement.slot.start, placement.slot.end);
            match interval {
                BusyInterval::Fixed(_) => {
                    prop_assert!(!overlaps, "{:?} overlaps meeting {:?}", placement.slot, interval);
                }
                BusyInterval::Placed(placed) if placed.priority.is_at_least(task.priority) => {
                    prop_assert!(
                        !overlaps,
                        "{:?} task overlaps {:?} placement {}",
                        task.priority,
                        placed.priority,
                        placed.task_id
                    );
                }
                BusyInterval::Placed(_) => {}
            }
        }
    }
}
