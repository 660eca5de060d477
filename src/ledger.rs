//! Per-task daily re-estimation ledger.
//!
//! Each task carries one remaining-hours slot per sprint day. A stand-up only
//! updates "today's remaining work": writing day *i* forward-replicates the
//! value into every later slot, so an unchanged task never needs day-by-day
//! re-entry. A zero is the sentinel for "fully burned down from here on" and
//! likewise propagates forward. Day 0 is never stored independently, it
//! mirrors the baseline estimate.

use crate::error::Reject;
use crate::task::{Task, SPRINT_SLOTS};

/// Write a day's re-estimate and replicate it forward.
///
/// A negative `value` is clamped to 0 rather than rejected, matching the
/// forgiving numeric-input behaviour the board has always had. `day == 0`
/// updates the baseline estimate itself. Applying the same write twice
/// leaves the ledger unchanged.
pub fn set_daily_value(task: &mut Task, day: usize, value: f64, now_utc: i64) -> Result<(), Reject> {
    if day >= SPRINT_SLOTS {
        return Err(Reject::InvalidInput(format!(
            "day {} out of range 1..={}",
            day + 1,
            SPRINT_SLOTS
        )));
    }
    debug_assert_eq!(task.daily_reestimates.len(), SPRINT_SLOTS);

    let value = value.max(0.0);
    if day == 0 {
        task.baseline_estimate = value;
    }
    // One pass covers both rules: a positive value replicates forward until
    // the next explicit write, a zero burns everything down from this day on.
    for slot in task.daily_reestimates[day..].iter_mut() {
        *slot = value;
    }
    task.updated_at_utc = now_utc;
    Ok(())
}

/// Read a day's remaining hours. Day 0 resolves to the baseline estimate;
/// days past the last slot resolve to the last slot, since a value persists
/// forward until rewritten.
pub fn daily_value(task: &Task, day: usize) -> f64 {
    debug_assert_eq!(task.daily_reestimates.len(), SPRINT_SLOTS);
    if day == 0 {
        task.baseline_estimate
    } else {
        task.daily_reestimates[day.min(SPRINT_SLOTS - 1)]
    }
}

/// True iff the task's remaining work is zero on the given day.
pub fn is_burned_down_by_day(task: &Task, day: usize) -> bool {
    daily_value(task, day) == 0.0
}

/// Smallest day whose ledger value is zero, or None if the task never
/// reaches zero within the sprint window.
pub fn completion_day(task: &Task) -> Option<usize> {
    (0..SPRINT_SLOTS).find(|&d| daily_value(task, d) == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(baseline: f64) -> Task {
        Task::new(1, "spike".into(), "s1".into(), baseline, 0)
    }

    #[test]
    fn write_replicates_forward() {
        let mut t = task(8.0);
        set_daily_value(&mut t, 3, 6.0, 10).unwrap();
        assert_eq!(t.daily_reestimates, vec![8.0, 8.0, 8.0, 6.0, 6.0, 6.0, 6.0, 6.0, 6.0, 6.0]);
        assert_eq!(t.updated_at_utc, 10);
    }

    #[test]
    fn zero_burns_down_from_day_onward() {
        let mut t = task(8.0);
        set_daily_value(&mut t, 3, 6.0, 10).unwrap();
        set_daily_value(&mut t, 5, 0.0, 20).unwrap();
        assert_eq!(t.daily_reestimates, vec![8.0, 8.0, 8.0, 6.0, 6.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(completion_day(&t), Some(5));
        assert!(is_burned_down_by_day(&t, 5));
        assert!(is_burned_down_by_day(&t, 9));
        assert!(!is_burned_down_by_day(&t, 4));
    }

    #[test]
    fn earlier_slots_are_untouched() {
        let mut t = task(8.0);
        set_daily_value(&mut t, 2, 5.0, 0).unwrap();
        set_daily_value(&mut t, 7, 1.0, 0).unwrap();
        assert_eq!(t.daily_reestimates[..7], [8.0, 8.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn write_is_idempotent() {
        let mut t = task(8.0);
        set_daily_value(&mut t, 4, 3.5, 0).unwrap();
        let once = t.daily_reestimates.clone();
        set_daily_value(&mut t, 4, 3.5, 0).unwrap();
        assert_eq!(t.daily_reestimates, once);
    }

    #[test]
    fn day_zero_updates_baseline_and_mirrors() {
        let mut t = task(8.0);
        set_daily_value(&mut t, 0, 12.0, 0).unwrap();
        assert_eq!(t.baseline_estimate, 12.0);
        assert_eq!(daily_value(&t, 0), 12.0);
        assert_eq!(daily_value(&t, 9), 12.0);
    }

    #[test]
    fn negative_input_clamps_to_zero() {
        let mut t = task(8.0);
        set_daily_value(&mut t, 6, -4.0, 0).unwrap();
        assert_eq!(t.daily_reestimates[6..], [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(completion_day(&t), Some(6));
    }

    #[test]
    fn out_of_range_day_is_rejected() {
        let mut t = task(8.0);
        let err = set_daily_value(&mut t, 10, 1.0, 0).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(t.daily_reestimates, vec![8.0; SPRINT_SLOTS]);
    }

    #[test]
    fn zero_baseline_completes_on_day_zero() {
        let t = task(0.0);
        assert_eq!(completion_day(&t), Some(0));
    }

    #[test]
    fn never_zero_has_no_completion_day() {
        let t = task(8.0);
        assert_eq!(completion_day(&t), None);
    }

    #[test]
    fn reads_past_window_resolve_to_last_slot() {
        let mut t = task(8.0);
        set_daily_value(&mut t, 9, 2.0, 0).unwrap();
        assert_eq!(daily_value(&t, 14), 2.0);
    }
}
