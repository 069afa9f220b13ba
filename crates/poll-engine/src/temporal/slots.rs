//! Stage 4: time slot generation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use super::{
    minutes_of, CandidateDate, TemporalConstraintSet, TimeSlot, TimeWindow,
    SLOT_GRANULARITY_MINUTES,
};
use crate::config::InterpreterConfig;

/// Build the time slots for `candidates`, grouped by `(start, end)` and
/// sorted by start time. Returns an empty list when the request carries no
/// time information, which makes the poll a date-only poll.
pub fn generate_time_slots(
    candidates: &[CandidateDate],
    c: &TemporalConstraintSet,
    config: &InterpreterConfig,
) -> Vec<TimeSlot> {
    let mut grouped: BTreeMap<(NaiveTime, NaiveTime), BTreeSet<NaiveDate>> = BTreeMap::new();

    for candidate in candidates {
        for window in windows_for(candidate, c, config) {
            for slot in split(window, c.duration_minutes, config.max_slots_per_day) {
                grouped
                    .entry((slot.start, slot.end))
                    .or_default()
                    .insert(candidate.date);
            }
        }
    }

    grouped
        .into_iter()
        .map(|((start, end), dates)| TimeSlot {
            start,
            end,
            dates: dates.into_iter().collect(),
        })
        .collect()
}

fn windows_for(
    candidate: &CandidateDate,
    c: &TemporalConstraintSet,
    config: &InterpreterConfig,
) -> Vec<TimeWindow> {
    if let Some(range) = c.time_range {
        return vec![range];
    }
    if let Some(start) = c.start_time {
        let length = c.duration_minutes.unwrap_or(config.default_slot_minutes);
        let start_min = minutes_of(start);
        return match TimeWindow::from_minutes(start_min, start_min + length) {
            Some(window) => vec![window],
            None => {
                debug!(%start, length, "slot would cross midnight, skipping");
                Vec::new()
            }
        };
    }
    if !candidate.periods.is_empty() {
        return candidate.periods.iter().map(|p| p.window()).collect();
    }
    if !c.periods.is_empty() {
        return c.periods.iter().map(|p| p.window()).collect();
    }
    if c.duration_minutes.is_some() {
        return vec![config.business_hours];
    }
    Vec::new()
}

/// Cut `window` into back-to-back slots of `duration` minutes, starting on
/// granularity boundaries. No duration keeps the window whole.
fn split(window: TimeWindow, duration: Option<u32>, max_slots: usize) -> Vec<TimeWindow> {
    let Some(duration) = duration else {
        return vec![window];
    };
    let stride = duration.div_ceil(SLOT_GRANULARITY_MINUTES) * SLOT_GRANULARITY_MINUTES;
    let end = minutes_of(window.end);
    let mut start = minutes_of(window.start);
    let mut slots = Vec::new();
    while start + duration <= end && slots.len() < max_slots {
        if let Some(slot) = TimeWindow::from_minutes(start, start + duration) {
            slots.push(slot);
        }
        start += stride;
    }
    if slots.is_empty() {
        debug!(duration, window_minutes = window.minutes(), "duration does not fit window");
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{extract_constraints, DayPeriod};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn cand(day: u32, periods: Vec<DayPeriod>) -> CandidateDate {
        CandidateDate {
            date: d(day),
            periods,
        }
    }

    fn windows(slots: &[TimeSlot]) -> Vec<(NaiveTime, NaiveTime)> {
        slots.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn test_bound_period_is_one_slot() {
        let c = extract_constraints("réunion lundi matin");
        let slots = generate_time_slots(
            &[cand(16, vec![DayPeriod::Morning])],
            &c,
            &InterpreterConfig::default(),
        );
        assert_eq!(
            slots,
            vec![TimeSlot {
                start: t(8, 0),
                end: t(12, 0),
                dates: vec![d(16)]
            }]
        );
    }

    #[test]
    fn test_each_day_keeps_its_own_period() {
        let c = extract_constraints("vendredi soir ou samedi matin");
        let slots = generate_time_slots(
            &[
                cand(13, vec![DayPeriod::Evening]),
                cand(14, vec![DayPeriod::Morning]),
            ],
            &c,
            &InterpreterConfig::default(),
        );
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start, t(8, 0));
        assert_eq!(slots[0].dates, vec![d(14)]);
        assert_eq!(slots[1].start, t(17, 0));
        assert_eq!(slots[1].dates, vec![d(13)]);
    }

    #[test]
    fn test_same_window_groups_dates() {
        let c = extract_constraints("le soir, tous les mardis");
        let slots = generate_time_slots(
            &[cand(17, vec![]), cand(24, vec![]), cand(31, vec![])],
            &c,
            &InterpreterConfig::default(),
        );
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].dates, vec![d(17), d(24), d(31)]);
    }

    #[test]
    fn test_duration_splits_window() {
        let c = extract_constraints("lundi matin pendant 1h");
        let slots = generate_time_slots(
            &[cand(16, vec![DayPeriod::Morning])],
            &c,
            &InterpreterConfig::default(),
        );
        assert_eq!(
            windows(&slots),
            vec![(t(8, 0), t(9, 0)), (t(9, 0), t(10, 0)), (t(10, 0), t(11, 0)), (t(11, 0), t(12, 0))]
        );
    }

    #[test]
    fn test_stride_rounds_up_to_granularity() {
        let c = extract_constraints("le soir, 45 minutes");
        let slots = generate_time_slots(&[cand(16, vec![])], &c, &InterpreterConfig::default());
        assert_eq!(
            windows(&slots),
            vec![(t(17, 0), t(17, 45)), (t(18, 0), t(18, 45))]
        );
    }

    #[test]
    fn test_max_slots_per_day() {
        let c = extract_constraints("une demi-heure");
        let config = InterpreterConfig {
            max_slots_per_day: 3,
            ..Default::default()
        };
        let slots = generate_time_slots(&[cand(16, vec![])], &c, &config);
        // Business hours, capped.
        assert_eq!(
            windows(&slots),
            vec![(t(9, 0), t(9, 30)), (t(9, 30), t(10, 0)), (t(10, 0), t(10, 30))]
        );
    }

    #[test]
    fn test_time_range_wins_over_period() {
        let c = extract_constraints("lundi matin de 10h à 11h30");
        let slots = generate_time_slots(
            &[cand(16, vec![DayPeriod::Morning])],
            &c,
            &InterpreterConfig::default(),
        );
        assert_eq!(windows(&slots), vec![(t(10, 0), t(11, 30))]);
    }

    #[test]
    fn test_start_time_uses_default_length() {
        let c = extract_constraints("lundi à 14h");
        let slots = generate_time_slots(&[cand(16, vec![])], &c, &InterpreterConfig::default());
        assert_eq!(windows(&slots), vec![(t(14, 0), t(15, 0))]);

        let c = extract_constraints("lundi à 23h30");
        assert!(generate_time_slots(&[cand(16, vec![])], &c, &InterpreterConfig::default()).is_empty());
    }

    #[test]
    fn test_no_time_information_means_no_slots() {
        let c = extract_constraints("tous les samedis de mars");
        assert!(generate_time_slots(&[cand(7, vec![])], &c, &InterpreterConfig::default()).is_empty());
    }

    #[test]
    fn test_duration_longer_than_window_yields_nothing() {
        let c = extract_constraints("le midi pendant 3h");
        assert!(generate_time_slots(&[cand(16, vec![])], &c, &InterpreterConfig::default()).is_empty());
    }
}
