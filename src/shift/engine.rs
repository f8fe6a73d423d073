//! Shift timing calculation.
//!
//! A single pure function turns an entry time, a tracked-work sample and the
//! current instant into the dashboard figures. Tracked work is assumed to keep
//! accruing in real time after it was sampled, so callers re-run the
//! calculation on every tick instead of re-polling the tracker.

use crate::shift::clock::ClockTime;
use crate::shift::duration::{Hms, minutes_to_clock_label, seconds_to_hms};
use crate::shift::schedule::{ScheduleConfig, ScheduleMode};
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculationInput {
    pub entry: ClockTime,
    pub tracked_base_seconds: i64,
    pub tracked_base_set_at: DateTime<Utc>,
    /// Current instant in the user's local offset; time-of-day is read from it.
    pub now: DateTime<FixedOffset>,
    pub mode: ScheduleMode,
}

/// Which budget currently decides the leave time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrivingConstraint {
    #[serde(rename = "timeDoctor")]
    TrackedWork,
    #[serde(rename = "entry")]
    Entry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationResult {
    pub mode: ScheduleMode,
    pub tracked_remaining: Hms,
    pub can_leave_at: String,
    pub stay_remaining: Hms,
    pub extra_time_required: Hms,
    pub effective_stay_remaining: Hms,
    pub effective_can_leave_at: String,
    pub driving_constraint: DrivingConstraint,
    pub free_time: Hms,
    pub progress_percent: u8,
    pub entry_elapsed_seconds: i64,
    pub tracked_seconds: i64,
    /// Signed; negative once the tracked quota is exceeded.
    pub tracked_remaining_seconds: i64,
    /// Signed; negative once the stay budget has passed.
    pub stay_remaining_seconds: i64,
}

pub fn calculate(input: &CalculationInput) -> CalculationResult {
    calculate_with(input, input.mode.config())
}

/// Same as [`calculate`] but with explicit hour targets instead of the mode's.
pub fn calculate_with(input: &CalculationInput, config: ScheduleConfig) -> CalculationResult {
    let required_work = config.required_work_seconds();
    let required_stay = config.required_stay_seconds();

    let now_of_day = i64::from(input.now.hour()) * 3600
        + i64::from(input.now.minute()) * 60
        + i64::from(input.now.second());

    let elapsed_since_set = (input.now.with_timezone(&Utc) - input.tracked_base_set_at)
        .num_seconds()
        .max(0);
    // Saturating throughout: any stored sample must produce figures, never a panic.
    let tracked = input.tracked_base_seconds.saturating_add(elapsed_since_set);
    let tracked_remaining = required_work.saturating_sub(tracked);

    let entry_of_day = input.entry.seconds_of_day();
    let can_leave_at = entry_of_day.saturating_add(required_stay);
    let stay_remaining = can_leave_at.saturating_sub(now_of_day);

    // Strict comparison: a tie is attributed to the entry-based budget.
    let driving_constraint = if tracked_remaining > stay_remaining {
        DrivingConstraint::TrackedWork
    } else {
        DrivingConstraint::Entry
    };

    let extra_time = if tracked_remaining > 0 {
        tracked_remaining.saturating_sub(stay_remaining.max(0)).max(0)
    } else {
        0
    };

    let effective_stay_remaining = stay_remaining.saturating_add(extra_time);
    let effective_can_leave_at = can_leave_at.saturating_add(extra_time);
    let free_time = stay_remaining.saturating_sub(tracked_remaining);

    CalculationResult {
        mode: input.mode,
        tracked_remaining: seconds_to_hms(tracked_remaining),
        can_leave_at: minutes_to_clock_label(can_leave_at as f64 / 60.0),
        stay_remaining: seconds_to_hms(stay_remaining),
        extra_time_required: seconds_to_hms(extra_time),
        effective_stay_remaining: seconds_to_hms(effective_stay_remaining),
        effective_can_leave_at: minutes_to_clock_label(effective_can_leave_at as f64 / 60.0),
        driving_constraint,
        free_time: seconds_to_hms(free_time),
        progress_percent: progress_percent(tracked, required_work),
        entry_elapsed_seconds: (now_of_day - entry_of_day).max(0),
        tracked_seconds: tracked,
        tracked_remaining_seconds: tracked_remaining,
        stay_remaining_seconds: stay_remaining,
    }
}

fn progress_percent(tracked: i64, required: i64) -> u8 {
    if required <= 0 {
        return 100;
    }
    let pct = (tracked as f64 / required as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, h, m, s)
            .unwrap()
    }

    fn input(entry: &str, tracked: i64, now: DateTime<FixedOffset>) -> CalculationInput {
        CalculationInput {
            entry: entry.parse().unwrap(),
            tracked_base_seconds: tracked,
            tracked_base_set_at: now.with_timezone(&Utc),
            now,
            mode: ScheduleMode::Regular,
        }
    }

    #[test]
    fn test_progress_rounds_half_up() {
        assert_eq!(progress_percent(10_800, 25_200), 43);
        assert_eq!(progress_percent(1, 200), 1);
    }

    #[test]
    fn test_progress_clamps() {
        assert_eq!(progress_percent(90_000, 25_200), 100);
        assert_eq!(progress_percent(0, 25_200), 0);
        assert_eq!(progress_percent(5, 0), 100);
    }

    #[test]
    fn test_tracked_time_extrapolates_since_sample() {
        let now = at(12, 0, 0);
        let mut inp = input("09:00", 3600, now);
        inp.tracked_base_set_at = (now - chrono::Duration::minutes(30)).with_timezone(&Utc);
        let result = calculate(&inp);
        assert_eq!(result.tracked_seconds, 3600 + 1800);
    }

    #[test]
    fn test_sample_in_the_future_adds_nothing() {
        let now = at(12, 0, 0);
        let mut inp = input("09:00", 3600, now);
        inp.tracked_base_set_at = (now + chrono::Duration::hours(1)).with_timezone(&Utc);
        assert_eq!(calculate(&inp).tracked_seconds, 3600);
    }

    #[test]
    fn test_tie_goes_to_entry() {
        // regular: work 7h, stay 9h; entry 09:00 → leave 18:00.
        // At 11:00 stay remaining is 7h; with 0 tracked, tracked remaining is 7h.
        let result = calculate(&input("09:00", 0, at(11, 0, 0)));
        assert_eq!(result.tracked_remaining_seconds, result.stay_remaining_seconds);
        assert_eq!(result.driving_constraint, DrivingConstraint::Entry);
        assert_eq!(result.extra_time_required, Hms::default());
    }

    #[test]
    fn test_extra_time_after_stay_budget_passed() {
        // 19:00, leave time was 18:00, 1h of work still missing.
        let result = calculate(&input("09:00", 6 * 3600, at(19, 0, 0)));
        assert_eq!(result.stay_remaining_seconds, -3600);
        assert_eq!(result.extra_time_required, seconds_to_hms(3600));
        assert_eq!(result.effective_stay_remaining, Hms::default());
        assert_eq!(result.effective_can_leave_at, "7:00 PM");
        assert_eq!(result.driving_constraint, DrivingConstraint::TrackedWork);
        assert_eq!(result.free_time, Hms::default());
    }

    #[test]
    fn test_extreme_tracked_sample_saturates() {
        let now = at(12, 0, 0);
        let mut inp = input("09:00", i64::MAX, now);
        inp.tracked_base_set_at = (now - chrono::Duration::seconds(10)).with_timezone(&Utc);
        let result = calculate(&inp);

        assert_eq!(result.tracked_seconds, i64::MAX);
        assert_eq!(result.tracked_remaining, Hms::default());
        assert_eq!(result.extra_time_required, Hms::default());
        assert_eq!(result.progress_percent, 100);
        assert_eq!(result.driving_constraint, DrivingConstraint::Entry);
    }

    #[test]
    fn test_negative_extreme_sample_saturates() {
        let now = at(12, 0, 0);
        let result = calculate(&input("09:00", i64::MIN, now));

        assert_eq!(result.tracked_remaining_seconds, i64::MAX);
        assert_eq!(result.free_time, Hms::default());
        assert_eq!(result.progress_percent, 0);
        assert_eq!(result.driving_constraint, DrivingConstraint::TrackedWork);
    }

    #[test]
    fn test_entry_in_future_clamps_elapsed() {
        let result = calculate(&input("14:00", 0, at(9, 0, 0)));
        assert_eq!(result.entry_elapsed_seconds, 0);
    }

    #[test]
    fn test_free_time() {
        let result = calculate(&input("09:00", 3 * 3600, at(13, 0, 0)));
        // stay 5h - tracked 4h
        assert_eq!(result.free_time, seconds_to_hms(3600));
    }
}
