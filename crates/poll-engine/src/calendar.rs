//! Calendar enumeration.
//!
//! The interpreter never does month-length or leap-year arithmetic itself; it
//! asks a [`CalendarLookup`] for "every Saturday between these dates" or "the
//! next four Mondays". [`RruleCalendar`] answers by expanding RFC 5545
//! recurrence rules.

use chrono::{Datelike, NaiveDate, Weekday};
use rrule::RRuleSet;

use crate::error::{PollError, Result};

/// Upper bound on instances expanded from a single rule.
const EXPANSION_LIMIT: u16 = 1000;

/// An inclusive range of whole months, possibly crossing a year boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSpan {
    pub start_year: i32,
    pub start_month: u32,
    pub end_year: i32,
    pub end_month: u32,
}

impl MonthSpan {
    pub fn single(year: i32, month: u32) -> Self {
        Self {
            start_year: year,
            start_month: month,
            end_year: year,
            end_month: month,
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year, self.start_month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let (ny, nm) = if self.end_month == 12 {
            (self.end_year + 1, 1)
        } else {
            (self.end_year, self.end_month + 1)
        };
        NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
    }
}

/// Source of concrete calendar dates.
pub trait CalendarLookup: Send + Sync {
    /// Every date in `start..=end` whose weekday is in `weekdays`, ascending.
    fn days_in_range(
        &self,
        weekdays: &[Weekday],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;

    /// The next `count` dates on or after `from` falling on `weekday`.
    fn next_occurrences(&self, weekday: Weekday, from: NaiveDate, count: usize)
        -> Result<Vec<NaiveDate>>;

    /// Every date of the month span whose weekday is in `weekdays`.
    fn days_in_month_span(&self, weekdays: &[Weekday], span: MonthSpan) -> Result<Vec<NaiveDate>> {
        let start = span.first_day().ok_or_else(|| {
            PollError::Calendar(format!(
                "invalid month {}-{:02}",
                span.start_year, span.start_month
            ))
        })?;
        let end = span.last_day().ok_or_else(|| {
            PollError::Calendar(format!("invalid month {}-{:02}", span.end_year, span.end_month))
        })?;
        self.days_in_range(weekdays, start, end)
    }
}

/// [`CalendarLookup`] backed by RRULE expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct RruleCalendar;

impl RruleCalendar {
    pub fn new() -> Self {
        Self
    }

    fn expand(&self, rule: &str, weekdays: &[Weekday]) -> Result<Vec<NaiveDate>> {
        let set: RRuleSet = rule
            .parse()
            .map_err(|e| PollError::Calendar(format!("'{rule}': {e}")))?;
        let mut dates: Vec<NaiveDate> = set
            .all(EXPANSION_LIMIT)
            .dates
            .iter()
            .map(|dt| dt.date_naive())
            // DTSTART is not always aligned with BYDAY.
            .filter(|d| weekdays.contains(&d.weekday()))
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }
}

impl CalendarLookup for RruleCalendar {
    fn days_in_range(
        &self,
        weekdays: &[Weekday],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        if weekdays.is_empty() || end < start {
            return Ok(Vec::new());
        }
        let rule = format!(
            "DTSTART:{}T000000Z\nRRULE:FREQ=DAILY;BYDAY={};UNTIL={}T235959Z",
            start.format("%Y%m%d"),
            byday(weekdays),
            end.format("%Y%m%d"),
        );
        let dates = self.expand(&rule, weekdays)?;
        Ok(dates
            .into_iter()
            .filter(|d| *d >= start && *d <= end)
            .collect())
    }

    fn next_occurrences(
        &self,
        weekday: Weekday,
        from: NaiveDate,
        count: usize,
    ) -> Result<Vec<NaiveDate>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        // One spare instance in case the expander also yields DTSTART.
        let rule = format!(
            "DTSTART:{}T000000Z\nRRULE:FREQ=DAILY;BYDAY={};COUNT={}",
            from.format("%Y%m%d"),
            byday(&[weekday]),
            count + 1,
        );
        let dates = self.expand(&rule, &[weekday])?;
        Ok(dates
            .into_iter()
            .filter(|d| *d >= from)
            .take(count)
            .collect())
    }
}

fn byday(weekdays: &[Weekday]) -> String {
    weekdays
        .iter()
        .map(|wd| match wd {
            Weekday::Mon => "MO",
            Weekday::Tue => "TU",
            Weekday::Wed => "WE",
            Weekday::Thu => "TH",
            Weekday::Fri => "FR",
            Weekday::Sat => "SA",
            Weekday::Sun => "SU",
        })
        .collect::<Vec<_>>()
        .join(",")
}
