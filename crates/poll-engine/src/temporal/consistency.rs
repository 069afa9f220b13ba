//! Stage 2: self-consistency check.
//!
//! Findings are advisory. They are shown to the model as part of its prompt
//! and returned with `--explain`; they never stop generation.

use chrono::Weekday;
use serde::Serialize;

use super::{weekday_label, DayPeriod, TemporalConstraintSet, TimeWindow};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Constraints that contradict each other.
    pub conflicts: Vec<String>,
    /// Ambiguities the user may want to clarify.
    pub suggestions: Vec<String>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.suggestions.is_empty()
    }
}

pub fn check_consistency(c: &TemporalConstraintSet) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();

    if c.weekend {
        for m in c.weekdays.iter().filter(|m| is_working_day(m.weekday)) {
            report.conflicts.push(format!(
                "'{}' is not part of the weekend (Saturday and Sunday only)",
                weekday_label(m.weekday)
            ));
        }
    }

    for m in &c.weekdays {
        if c.excluded_weekdays.contains(&m.weekday) {
            report.conflicts.push(format!(
                "'{}' is both requested and excluded",
                weekday_label(m.weekday)
            ));
        }
    }

    if c.periods.contains(&DayPeriod::Morning) && c.periods.contains(&DayPeriod::Evening) {
        report.suggestions.push(
            "both morning and evening mentioned without a day: offer both or ask which one"
                .to_string(),
        );
    }

    let periods = c.all_periods();
    let explicit = c
        .time_range
        .or_else(|| c.start_time.map(|t| TimeWindow::new(t, t)));
    if let Some(window) = explicit {
        if !periods.is_empty() && !periods.iter().any(|p| p.window().contains(&window)) {
            report.conflicts.push(format!(
                "explicit time {} is outside the requested period ({})",
                window.start.format("%H:%M"),
                periods.iter().map(|p| p.label()).collect::<Vec<_>>().join(", ")
            ));
        }
    }

    if let Some(duration) = c.duration_minutes {
        let window = c
            .time_range
            .or_else(|| periods.iter().map(|p| p.window()).max_by_key(|w| w.minutes()));
        if let Some(window) = window {
            if duration > window.minutes() {
                report.conflicts.push(format!(
                    "duration of {duration} min does not fit in {}-{}",
                    window.start.format("%H:%M"),
                    window.end.format("%H:%M")
                ));
            }
        }
    }

    if c.urgent {
        if let Some(m) = c.month {
            report.suggestions.push(format!(
                "request is urgent but anchored on month {}: prefer the earliest dates",
                m.start_month
            ));
        }
        if c.repeats() {
            report
                .suggestions
                .push("request is urgent but recurring: first occurrence matters most".to_string());
        }
    }

    if c.recurring && c.weekdays.is_empty() && !c.weekend && !c.working_days {
        report
            .suggestions
            .push("recurrence requested without a day of the week".to_string());
    }

    report
}

fn is_working_day(weekday: Weekday) -> bool {
    !matches!(weekday, Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::extract_constraints;

    #[test]
    fn test_clean_request_has_no_findings() {
        let report = check_consistency(&extract_constraints("réunion lundi matin"));
        assert!(report.is_clean(), "got: {report:?}");
    }

    #[test]
    fn test_weekday_with_weekend_is_a_conflict() {
        let report = check_consistency(&extract_constraints("vendredi ou ce week-end"));
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.conflicts[0].contains("vendredi"));
    }

    #[test]
    fn test_saturday_with_weekend_is_fine() {
        let report = check_consistency(&extract_constraints("samedi ce week-end"));
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_morning_and_evening_is_ambiguous() {
        let report = check_consistency(&extract_constraints("plutôt le matin ou le soir"));
        assert!(report.conflicts.is_empty());
        assert_eq!(report.suggestions.len(), 1);
    }

    #[test]
    fn test_included_and_excluded_day() {
        let report = check_consistency(&extract_constraints("lundi mais pas le lundi"));
        assert!(report.conflicts.iter().any(|c| c.contains("both requested and excluded")));
    }

    #[test]
    fn test_time_outside_period() {
        let report = check_consistency(&extract_constraints("lundi matin à 15h"));
        assert!(report.conflicts.iter().any(|c| c.contains("15:00")));

        let report = check_consistency(&extract_constraints("lundi matin à 10h"));
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_duration_longer_than_window() {
        let report = check_consistency(&extract_constraints("le midi pendant 3h"));
        assert!(report.conflicts.iter().any(|c| c.contains("180 min")));
    }

    #[test]
    fn test_recurrence_without_day() {
        let report = check_consistency(&extract_constraints("chaque matin"));
        assert_eq!(
            report.suggestions,
            vec!["recurrence requested without a day of the week".to_string()]
        );
    }
}
