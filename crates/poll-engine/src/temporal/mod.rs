//! Natural-language scheduling requests → date poll proposals.
//!
//! A request such as "tous les samedis de mars 2026" or "réunion lundi matin"
//! goes through four stages, each usable on its own:
//!
//! 1. [`extract_constraints`] — lexical scan producing a [`TemporalConstraintSet`]
//! 2. [`check_consistency`] — advisory conflicts and ambiguity notes
//! 3. [`enumerate_dates`] — concrete calendar dates, never before "today"
//! 4. [`generate_time_slots`] — time windows tagged with the dates they apply to
//!
//! [`TemporalRequestInterpreter`] chains them and optionally asks a language
//! model for wording. All functions take "today" explicitly; nothing here
//! reads the system clock.

mod consistency;
mod constraints;
mod enumerate;
mod interpreter;
mod slots;

pub use consistency::{check_consistency, ConsistencyReport};
pub use constraints::extract_constraints;
pub use enumerate::enumerate_dates;
pub use interpreter::{today_in, Interpretation, TemporalRequestInterpreter, DEFAULT_TITLE};
pub use slots::generate_time_slots;

use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Granularity of generated slot boundaries, in minutes.
pub const SLOT_GRANULARITY_MINUTES: u32 = 30;

// ── Time windows ────────────────────────────────────────────────────────────

/// A time-of-day interval on a single day. `start < end` for every window this
/// crate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "crate::hhmm")]
    pub start: NaiveTime,
    #[serde(with = "crate::hhmm")]
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub(crate) fn from_minutes(start: u32, end: u32) -> Option<Self> {
        Some(Self::new(time_from_minutes(start)?, time_from_minutes(end)?))
    }

    pub fn minutes(&self) -> u32 {
        minutes_of(self.end).saturating_sub(minutes_of(self.start))
    }

    /// Whether `other` lies entirely inside this window.
    pub fn contains(&self, other: &TimeWindow) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

pub(crate) fn minutes_of(t: NaiveTime) -> u32 {
    t.num_seconds_from_midnight() / 60
}

/// `None` past 23:59.
pub(crate) fn time_from_minutes(m: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(m / 60, m % 60, 0)
}

// ── Periods ─────────────────────────────────────────────────────────────────

/// Named part of the day. The boundaries are fixed:
///
/// | period | window |
/// |---|---|
/// | matin | 08:00–12:00 |
/// | midi | 12:00–14:00 |
/// | après-midi | 14:00–17:00 |
/// | soir | 17:00–19:00 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Noon,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub fn window(self) -> TimeWindow {
        let (start, end) = match self {
            DayPeriod::Morning => (8 * 60, 12 * 60),
            DayPeriod::Noon => (12 * 60, 14 * 60),
            DayPeriod::Afternoon => (14 * 60, 17 * 60),
            DayPeriod::Evening => (17 * 60, 19 * 60),
        };
        TimeWindow::from_minutes(start, end).unwrap_or(TimeWindow::new(NaiveTime::MIN, NaiveTime::MIN))
    }

    pub fn label(self) -> &'static str {
        match self {
            DayPeriod::Morning => "matin",
            DayPeriod::Noon => "midi",
            DayPeriod::Afternoon => "après-midi",
            DayPeriod::Evening => "soir",
        }
    }
}

// ── Constraint set ──────────────────────────────────────────────────────────

/// A weekday named in the request, with the period written next to it
/// ("vendredi soir").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekdayMention {
    pub weekday: Weekday,
    pub period: Option<DayPeriod>,
    /// Written in the plural ("les lundis"), which asks for every occurrence.
    pub plural: bool,
}

/// A specific day named in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRef {
    /// Offset from today: 0 "aujourd'hui", 1 "demain", 2 "après-demain".
    Relative(i64),
    /// Day and month, with the year when one was written.
    Calendar { day: u32, month: u32, year: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateMention {
    pub date: DateRef,
    pub period: Option<DayPeriod>,
}

/// "mars", "mars 2026", "de mars à mai".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthAnchor {
    pub start_month: u32,
    pub end_month: u32,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekScope {
    /// "cette semaine": today through today + 7 days.
    This,
    /// "la semaine prochaine": the 7 days after the current week.
    Next,
}

/// Everything [`extract_constraints`] understood in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemporalConstraintSet {
    /// In order of appearance.
    pub weekdays: Vec<WeekdayMention>,
    pub excluded_weekdays: Vec<Weekday>,
    pub dates: Vec<DateMention>,
    /// Periods not attached to a specific day.
    pub periods: Vec<DayPeriod>,
    pub weekend: bool,
    /// "en semaine": Monday to Friday.
    pub working_days: bool,
    pub month: Option<MonthAnchor>,
    pub week_scope: Option<WeekScope>,
    pub time_range: Option<TimeWindow>,
    pub start_time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub occurrence_count: Option<usize>,
    pub recurring: bool,
    pub urgent: bool,
}

impl TemporalConstraintSet {
    pub fn has_day_signal(&self) -> bool {
        !self.weekdays.is_empty()
            || self.weekend
            || self.working_days
            || !self.dates.is_empty()
            || self.month.is_some()
            || self.week_scope.is_some()
    }

    pub fn has_time_signal(&self) -> bool {
        !self.periods.is_empty()
            || self.weekdays.iter().any(|m| m.period.is_some())
            || self.dates.iter().any(|m| m.period.is_some())
            || self.time_range.is_some()
            || self.start_time.is_some()
            || self.duration_minutes.is_some()
    }

    /// Whether every occurrence of the named days is wanted: an explicit
    /// marker ("tous les", "chaque") or a plural weekday.
    pub fn repeats(&self) -> bool {
        self.recurring || self.weekdays.iter().any(|m| m.plural)
    }

    /// No day, period, date or time information at all.
    pub fn is_empty(&self) -> bool {
        !self.has_day_signal() && !self.has_time_signal()
    }

    /// Every period mentioned, bound or free-standing, without duplicates.
    pub fn all_periods(&self) -> Vec<DayPeriod> {
        let mut periods: Vec<DayPeriod> = self
            .weekdays
            .iter()
            .filter_map(|m| m.period)
            .chain(self.dates.iter().filter_map(|m| m.period))
            .chain(self.periods.iter().copied())
            .collect();
        periods.sort();
        periods.dedup();
        periods
    }

    /// One-line summary used in model prompts and `--explain` output.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.weekdays.is_empty() {
            let days: Vec<String> = self
                .weekdays
                .iter()
                .map(|m| match m.period {
                    Some(p) => format!("{} {}", weekday_label(m.weekday), p.label()),
                    None => weekday_label(m.weekday).to_string(),
                })
                .collect();
            parts.push(format!("days: {}", days.join(", ")));
        }
        if !self.excluded_weekdays.is_empty() {
            let days: Vec<&str> = self.excluded_weekdays.iter().map(|w| weekday_label(*w)).collect();
            parts.push(format!("except: {}", days.join(", ")));
        }
        if self.weekend {
            parts.push("weekend".to_string());
        }
        if self.working_days {
            parts.push("working days".to_string());
        }
        if !self.dates.is_empty() {
            parts.push(format!("explicit dates: {}", self.dates.len()));
        }
        if let Some(m) = self.month {
            let year = m.year.map(|y| format!(" {y}")).unwrap_or_default();
            if m.start_month == m.end_month {
                parts.push(format!("month: {}{}", m.start_month, year));
            } else {
                parts.push(format!("months: {}-{}{}", m.start_month, m.end_month, year));
            }
        }
        match self.week_scope {
            Some(WeekScope::This) => parts.push("this week".to_string()),
            Some(WeekScope::Next) => parts.push("next week".to_string()),
            None => {}
        }
        if !self.periods.is_empty() {
            let labels: Vec<&str> = self.periods.iter().map(|p| p.label()).collect();
            parts.push(format!("periods: {}", labels.join(", ")));
        }
        if let Some(r) = self.time_range {
            parts.push(format!("between {} and {}", r.start.format("%H:%M"), r.end.format("%H:%M")));
        }
        if let Some(t) = self.start_time {
            parts.push(format!("at {}", t.format("%H:%M")));
        }
        if let Some(d) = self.duration_minutes {
            parts.push(format!("duration: {d} min"));
        }
        if let Some(n) = self.occurrence_count {
            parts.push(format!("occurrences: {n}"));
        }
        if self.repeats() {
            parts.push("recurring".to_string());
        }
        if self.urgent {
            parts.push("urgent".to_string());
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join("; ")
        }
    }
}

pub(crate) fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lundi",
        Weekday::Tue => "mardi",
        Weekday::Wed => "mercredi",
        Weekday::Thu => "jeudi",
        Weekday::Fri => "vendredi",
        Weekday::Sat => "samedi",
        Weekday::Sun => "dimanche",
    }
}

// ── Output ──────────────────────────────────────────────────────────────────

/// A concrete date chosen by [`enumerate_dates`], with the periods that were
/// written next to the day that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateDate {
    pub date: NaiveDate,
    pub periods: Vec<DayPeriod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollKind {
    /// Whole days, no hours.
    Date,
    /// At least one time slot.
    Datetime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "crate::hhmm")]
    pub start: NaiveTime,
    #[serde(with = "crate::hhmm")]
    pub end: NaiveTime,
    pub dates: Vec<NaiveDate>,
}

/// The proposal handed to the poll editor.
///
/// Every date, including those inside `time_slots`, is on or after the
/// "today" the suggestion was generated for. `time_slots` is empty exactly
/// when `kind` is [`PollKind::Date`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSuggestion {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: PollKind,
    pub dates: Vec<NaiveDate>,
    pub time_slots: Vec<TimeSlot>,
}

impl PollSuggestion {
    pub fn new(title: impl Into<String>, dates: Vec<NaiveDate>, time_slots: Vec<TimeSlot>) -> Self {
        let kind = if time_slots.is_empty() {
            PollKind::Date
        } else {
            PollKind::Datetime
        };
        Self {
            title: title.into(),
            kind,
            dates,
            time_slots,
        }
    }

    /// Every date referenced by the suggestion, slots included.
    pub fn all_dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates
            .iter()
            .chain(self.time_slots.iter().flat_map(|s| s.dates.iter()))
    }
}
