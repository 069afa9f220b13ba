//! Stage 3: candidate date enumeration.
//!
//! Turns day constraints into concrete dates through a [`CalendarLookup`].
//! Dates before `today` are always dropped; when that leaves nothing the
//! request is rejected with [`PollError::NoFutureDates`] instead of producing
//! an empty poll.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use super::{CandidateDate, DateRef, DayPeriod, MonthAnchor, TemporalConstraintSet, WeekScope};
use crate::calendar::{CalendarLookup, MonthSpan};
use crate::config::InterpreterConfig;
use crate::error::{PollError, Result};

const WORKING_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];
const WEEKEND: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];

/// Enumerate the calendar dates matching `c`, sorted, deduplicated, all
/// `>= today`, at most `config.max_dates` of them.
///
/// # Errors
///
/// - [`PollError::UnparseableRequest`] if `c` holds no temporal constraint.
/// - [`PollError::NoFutureDates`] if no candidate is on or after `today`.
/// - [`PollError::Calendar`] if the calendar lookup fails.
pub fn enumerate_dates(
    c: &TemporalConstraintSet,
    today: NaiveDate,
    config: &InterpreterConfig,
    calendar: &dyn CalendarLookup,
) -> Result<Vec<CandidateDate>> {
    if c.is_empty() {
        return Err(PollError::UnparseableRequest(
            "no day, period or date constraint found".to_string(),
        ));
    }

    let mut raw: Vec<(NaiveDate, Option<DayPeriod>)> = Vec::new();

    for mention in &c.dates {
        match resolve_date(mention.date, today) {
            Some(date) => raw.push((date, mention.period)),
            None => debug!(date = ?mention.date, "skipping impossible calendar date"),
        }
    }

    let days = requested_days(c);
    if !days.is_empty() {
        raw.extend(enumerate_days(&days, c, today, config, calendar)?);
    } else if c.dates.is_empty() {
        let dates = if let Some(anchor) = c.month {
            calendar.days_in_month_span(&WORKING_DAYS, resolve_month_span(anchor, today))?
        } else if let Some(scope) = c.week_scope {
            let (start, end) = week_window(scope, today, config);
            calendar.days_in_range(&WORKING_DAYS, start, end)?
        } else {
            let start = first_search_day(c, today);
            let end = start + Duration::days(config.default_horizon_days - 1);
            calendar.days_in_range(&WORKING_DAYS, start, end)?
        };
        raw.extend(dates.into_iter().map(|d| (d, None)));
    }

    raw.retain(|(date, _)| !c.excluded_weekdays.contains(&date.weekday()));

    let enumerated = raw.len();
    let mut merged: BTreeMap<NaiveDate, Vec<DayPeriod>> = BTreeMap::new();
    for (date, period) in raw.into_iter().filter(|(date, _)| *date >= today) {
        let periods = merged.entry(date).or_default();
        if let Some(p) = period {
            if !periods.contains(&p) {
                periods.push(p);
            }
        }
    }

    if merged.is_empty() {
        return Err(PollError::NoFutureDates(if enumerated == 0 {
            "no calendar date matches the request".to_string()
        } else {
            format!("all {enumerated} candidate dates are before {today}")
        }));
    }

    if merged.len() > config.max_dates {
        debug!(
            candidates = merged.len(),
            max_dates = config.max_dates,
            "truncating candidate dates"
        );
    }

    Ok(merged
        .into_iter()
        .take(config.max_dates)
        .map(|(date, mut periods)| {
            periods.sort();
            CandidateDate { date, periods }
        })
        .collect())
}

/// Weekdays to enumerate, each with the periods bound to it, in order of
/// first mention.
fn requested_days(c: &TemporalConstraintSet) -> Vec<(Weekday, Vec<DayPeriod>)> {
    let mut days: Vec<(Weekday, Vec<DayPeriod>)> = Vec::new();
    let mut add = |weekday: Weekday, period: Option<DayPeriod>| {
        let idx = match days.iter().position(|(w, _)| *w == weekday) {
            Some(idx) => idx,
            None => {
                days.push((weekday, Vec::new()));
                days.len() - 1
            }
        };
        if let Some(p) = period {
            if !days[idx].1.contains(&p) {
                days[idx].1.push(p);
            }
        }
    };
    for m in &c.weekdays {
        add(m.weekday, m.period);
    }
    if c.working_days {
        for w in WORKING_DAYS {
            add(w, None);
        }
    }
    if c.weekend {
        for w in WEEKEND {
            add(w, None);
        }
    }
    days
}

fn enumerate_days(
    days: &[(Weekday, Vec<DayPeriod>)],
    c: &TemporalConstraintSet,
    today: NaiveDate,
    config: &InterpreterConfig,
    calendar: &dyn CalendarLookup,
) -> Result<Vec<(NaiveDate, Option<DayPeriod>)>> {
    let weekdays: Vec<Weekday> = days.iter().map(|(w, _)| *w).collect();
    let repeats = c.repeats() || c.occurrence_count.is_some();

    let dates: Vec<NaiveDate> = if let Some(anchor) = c.month {
        let span = calendar.days_in_month_span(&weekdays, resolve_month_span(anchor, today))?;
        if repeats {
            span
        } else {
            // "un lundi en avril": the first one, not every Monday of April.
            let named: Vec<Weekday> = c.weekdays.iter().map(|m| m.weekday).collect();
            first_of_each(span, &named, today)
        }
    } else if let Some(scope) = c.week_scope {
        let (start, end) = week_window(scope, today, config);
        let window = calendar.days_in_range(&weekdays, start, end)?;
        if repeats {
            window
        } else {
            first_of_each(window, &weekdays, today)
        }
    } else if repeats {
        let count = c.occurrence_count.unwrap_or(config.default_occurrences);
        let start = first_search_day(c, today);
        let mut all = Vec::new();
        for w in &weekdays {
            all.extend(calendar.next_occurrences(*w, start, count)?);
        }
        all
    } else if is_plain_weekend(c) {
        // The coming weekend: first Saturday on or after today, then Sunday.
        let saturday = calendar
            .next_occurrences(Weekday::Sat, today, 1)?
            .into_iter()
            .next();
        saturday
            .map(|sat| vec![sat, sat + Duration::days(1)])
            .unwrap_or_default()
    } else {
        // One occurrence per day, each on or after the previous one.
        let mut cursor = first_search_day(c, today);
        let mut chain = Vec::new();
        for w in &weekdays {
            if let Some(date) = calendar.next_occurrences(*w, cursor, 1)?.into_iter().next() {
                chain.push(date);
                cursor = date;
            }
        }
        chain
    };

    let mut out = Vec::new();
    for date in dates {
        let periods = days
            .iter()
            .find(|(w, _)| *w == date.weekday())
            .map(|(_, p)| p.as_slice())
            .unwrap_or_default();
        if periods.is_empty() {
            out.push((date, None));
        } else {
            out.extend(periods.iter().map(|p| (date, Some(*p))));
        }
    }
    Ok(out)
}

/// Keep only the first date on or after `today` of each weekday in `once`.
/// Other weekdays pass through.
fn first_of_each(dates: Vec<NaiveDate>, once: &[Weekday], today: NaiveDate) -> Vec<NaiveDate> {
    let mut seen: Vec<Weekday> = Vec::new();
    dates
        .into_iter()
        .filter(|date| {
            let weekday = date.weekday();
            if !once.contains(&weekday) {
                return true;
            }
            if *date < today || seen.contains(&weekday) {
                return false;
            }
            seen.push(weekday);
            true
        })
        .collect()
}

fn is_plain_weekend(c: &TemporalConstraintSet) -> bool {
    c.weekend && c.weekdays.is_empty() && !c.working_days
}

/// Named days start tomorrow ("lundi" said on a Monday is next week's);
/// urgent requests may use today.
fn first_search_day(c: &TemporalConstraintSet, today: NaiveDate) -> NaiveDate {
    if c.urgent {
        today
    } else {
        today + Duration::days(1)
    }
}

fn resolve_date(date: DateRef, today: NaiveDate) -> Option<NaiveDate> {
    match date {
        DateRef::Relative(offset) => Some(today + Duration::days(offset)),
        DateRef::Calendar {
            day,
            month,
            year: Some(year),
        } => NaiveDate::from_ymd_opt(year, month, day),
        DateRef::Calendar {
            day,
            month,
            year: None,
        } => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
            match this_year {
                Some(d) if d >= today => Some(d),
                _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
            }
        }
    }
}

/// A month without a year that already passed this year means next year.
fn resolve_month_span(anchor: MonthAnchor, today: NaiveDate) -> MonthSpan {
    let start_year = anchor.year.unwrap_or_else(|| {
        if anchor.start_month < today.month() {
            today.year() + 1
        } else {
            today.year()
        }
    });
    let end_year = if anchor.end_month < anchor.start_month {
        start_year + 1
    } else {
        start_year
    };
    MonthSpan {
        start_year,
        start_month: anchor.start_month,
        end_year,
        end_month: anchor.end_month,
    }
}

/// Inclusive bounds of "cette semaine" / "la semaine prochaine".
fn week_window(scope: WeekScope, today: NaiveDate, config: &InterpreterConfig) -> (NaiveDate, NaiveDate) {
    match scope {
        WeekScope::This => (today, today + Duration::days(7)),
        WeekScope::Next => {
            let days_until_next_start = 7 - config.week_start.days_from_start(today.weekday());
            let start = today + Duration::days(days_until_next_start);
            (start, start + Duration::days(6))
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
