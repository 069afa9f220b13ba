//! Stage 1: lexical constraint extraction.
//!
//! The request is lower-cased and accent-folded ("après-midi" → "apres-midi",
//! "aujourd'hui" → "aujourd hui"). Numeric expressions (dates, time ranges,
//! durations, counts, clock times) are matched with regexes and blanked out;
//! the remaining words are then scanned left to right so a period written
//! right after a day ("vendredi soir") binds to that day.

use std::ops::Range;

use chrono::{NaiveTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    time_from_minutes, DateMention, DateRef, DayPeriod, MonthAnchor,
    TemporalConstraintSet, TimeWindow, WeekScope, WeekdayMention,
};

/// A clock time: "14h", "14 h", "14h30", "14:30".
const CLOCK: &str = r"\d{1,2}\s*h(?:\d{2})?\b|\d{1,2}:\d{2}\b";

/// A weekday written in front of a numeric date ("lundi 23/03") is part of it.
const DAY_NAME_PREFIX: &str =
    r"(?:\b(?:lundi|mardi|mercredi|jeudi|vendredi|samedi|dimanche)\s+(?:le\s+)?)?";

static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{DAY_NAME_PREFIX}\b(\d{{4}})-(\d{{2}})-(\d{{2}})\b")).expect("valid regex")
});

static SLASH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{DAY_NAME_PREFIX}\b(\d{{1,2}})/(\d{{1,2}})(?:/(\d{{4}}))?\b"))
        .expect("valid regex")
});

static RANGE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:de|entre)\s+({CLOCK})\s*(?:a|et|au|jusqu a)\s+({CLOCK})"
    ))
    .expect("valid regex")
});

static RANGE_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"({CLOCK})\s*-\s*({CLOCK})")).expect("valid regex"));

static COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2}|deux|trois|quatre|cinq|six|sept|huit|neuf|dix)\s+(?:prochain|prochaine|premier|premiere)s\b")
        .expect("valid regex")
});

static COUNT_WEEKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bpendant\s+(\d{1,2}|deux|trois|quatre|cinq|six|sept|huit|neuf|dix)\s+semaines\b")
        .expect("valid regex")
});

/// "pendant 2h", "duree 1h30", "de 2h", "d'1h" (short durations only, see below).
static DURATION_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(pendant|duree(?:\s+de)?|de|d)\s+(\d{1,2})\s*h(\d{2})?\b").expect("valid regex")
});

static DURATION_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3})\s*(?:min|mins|minutes)\b").expect("valid regex"));

static DURATION_HOURS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s*heures?(?:\s+(\d{2}))?\b").expect("valid regex")
});

static DURATION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(une|deux|trois|quatre)\s+heures?(\s+et\s+demie)?\b").expect("valid regex")
});

static HALF_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bune\s+demi\s*-?\s*heure\b").expect("valid regex"));

static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("({CLOCK})")).expect("valid regex"));

/// "de Nh" or a bare "Nh" reads as a duration up to this many hours, as a
/// start time above.
const MAX_DE_DURATION_HOURS: u32 = 4;

/// Words that make the clock time after them a start time: "a 1h", "vers 2h".
const START_CUES: &[&str] = &["a", "vers", "des", "avant", "apres"];

/// Extract every temporal constraint found in `utterance`.
///
/// Unrecognized words are ignored; an utterance with no temporal content
/// yields an empty set (see [`TemporalConstraintSet::is_empty`]).
pub fn extract_constraints(utterance: &str) -> TemporalConstraintSet {
    let mut text = fold(utterance);
    let mut c = TemporalConstraintSet::default();

    scan_numeric_dates(&mut text, &mut c);
    scan_time_ranges(&mut text, &mut c);
    scan_counts(&mut text, &mut c);
    scan_durations(&mut text, &mut c);
    scan_clock_times(&mut text, &mut c);

    let words: Vec<&str> = text
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    scan_words(&words, &mut c);

    c
}

/// Lower-case, strip French accents, split elisions ("l'après-midi").
pub(crate) fn fold(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|ch| match ch {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            '\'' | '’' => ' ',
            other => other,
        })
        .collect()
}

fn blank(text: &mut String, range: Range<usize>) {
    let spaces = " ".repeat(range.len());
    text.replace_range(range, &spaces);
}

/// Apply `f` to every match of `re`, then blank the matched spans.
fn consume<F>(text: &mut String, re: &Regex, mut f: F)
where
    F: FnMut(&regex::Captures<'_>) -> bool,
{
    let mut spans = Vec::new();
    for caps in re.captures_iter(text.as_str()) {
        if f(&caps) {
            if let Some(m) = caps.get(0) {
                spans.push(m.range());
            }
        }
    }
    for span in spans {
        blank(text, span);
    }
}

// ── Numeric scans ───────────────────────────────────────────────────────────

fn scan_numeric_dates(text: &mut String, c: &mut TemporalConstraintSet) {
    consume(text, &ISO_DATE, |caps| {
        let year = caps[1].parse().ok();
        let month = caps[2].parse().ok();
        let day = caps[3].parse().ok();
        match (year, month, day) {
            (Some(year), Some(month), Some(day)) => {
                c.dates.push(DateMention {
                    date: DateRef::Calendar {
                        day,
                        month,
                        year: Some(year),
                    },
                    period: None,
                });
                true
            }
            _ => false,
        }
    });
    consume(text, &SLASH_DATE, |caps| {
        let day: Option<u32> = caps[1].parse().ok();
        let month: Option<u32> = caps[2].parse().ok();
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        match (day, month) {
            (Some(day), Some(month)) if (1..=12).contains(&month) => {
                c.dates.push(DateMention {
                    date: DateRef::Calendar { day, month, year },
                    period: None,
                });
                true
            }
            _ => false,
        }
    });
}

fn scan_time_ranges(text: &mut String, c: &mut TemporalConstraintSet) {
    for re in [&*RANGE_WORDS, &*RANGE_DASH] {
        consume(text, re, |caps| {
            if c.time_range.is_some() {
                return false;
            }
            match (parse_clock(&caps[1]), parse_clock(&caps[2])) {
                (Some(start), Some(end)) if start < end => {
                    c.time_range = Some(TimeWindow::new(start, end));
                    true
                }
                _ => false,
            }
        });
    }
}

fn scan_counts(text: &mut String, c: &mut TemporalConstraintSet) {
    consume(text, &COUNT_WEEKS, |caps| match parse_small_number(&caps[1]) {
        Some(n) if n > 0 => {
            c.occurrence_count = Some(n);
            c.recurring = true;
            true
        }
        _ => false,
    });
    consume(text, &COUNT, |caps| match parse_small_number(&caps[1]) {
        Some(n) if n > 0 => {
            c.occurrence_count = Some(n);
            true
        }
        _ => false,
    });
}

fn scan_durations(text: &mut String, c: &mut TemporalConstraintSet) {
    consume(text, &DURATION_CUE, |caps| {
        let hours: u32 = caps[2].parse().unwrap_or(0);
        let minutes: u32 = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        if matches!(&caps[1], "de" | "d") && hours > MAX_DE_DURATION_HOURS {
            return false;
        }
        set_duration(c, hours * 60 + minutes)
    });
    consume(text, &HALF_HOUR, |_| set_duration(c, 30));
    consume(text, &DURATION_WORDS, |caps| {
        let hours = parse_small_number(&caps[1]).unwrap_or(0) as u32;
        let half = if caps.get(2).is_some() { 30 } else { 0 };
        set_duration(c, hours * 60 + half)
    });
    consume(text, &DURATION_HOURS, |caps| {
        let hours: u32 = caps[1].parse().unwrap_or(0);
        let minutes: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        set_duration(c, hours * 60 + minutes)
    });
    consume(text, &DURATION_MINUTES, |caps| {
        set_duration(c, caps[1].parse().unwrap_or(0))
    });
}

fn set_duration(c: &mut TemporalConstraintSet, minutes: u32) -> bool {
    if minutes == 0 || minutes >= 24 * 60 {
        return false;
    }
    if c.duration_minutes.is_none() {
        c.duration_minutes = Some(minutes);
    }
    true
}

/// Clock times left after ranges and cued durations. A short "Nh" with no
/// start cue in front ("reunion 1h lundi") is a duration.
fn scan_clock_times(text: &mut String, c: &mut TemporalConstraintSet) {
    let found: Vec<(Range<usize>, bool)> = CLOCK_TIME
        .find_iter(text.as_str())
        .map(|m| {
            let cued = text[..m.start()]
                .split_whitespace()
                .next_back()
                .is_some_and(|w| START_CUES.contains(&w));
            (m.range(), cued)
        })
        .collect();

    for (range, cued) in found {
        let token = text[range.clone()].to_string();
        let duration = if cued { None } else { bare_duration(&token) };
        match (duration, parse_clock(&token)) {
            (Some(minutes), _) if c.duration_minutes.is_none() => {
                set_duration(c, minutes);
            }
            (_, Some(t)) => {
                c.start_time.get_or_insert(t);
            }
            _ => continue,
        }
        blank(text, range);
    }
}

/// "1h" → 60, "1h30" → 90; `None` past [`MAX_DE_DURATION_HOURS`] or for "14:30".
fn bare_duration(token: &str) -> Option<u32> {
    let compact: String = token.chars().filter(|ch| !ch.is_whitespace()).collect();
    let (h, m) = compact.split_once('h')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = if m.is_empty() { 0 } else { m.parse().ok()? };
    (1..=MAX_DE_DURATION_HOURS)
        .contains(&hours)
        .then_some(hours * 60 + minutes)
}

/// "14h" → 14:00, "9h30" → 09:30, "14:30" → 14:30.
fn parse_clock(s: &str) -> Option<NaiveTime> {
    let compact: String = s.chars().filter(|ch| !ch.is_whitespace()).collect();
    let (h, m) = compact
        .split_once('h')
        .or_else(|| compact.split_once(':'))?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = if m.is_empty() { 0 } else { m.parse().ok()? };
    if hour > 23 || minute > 59 {
        return None;
    }
    time_from_minutes(hour * 60 + minute)
}

fn parse_small_number(s: &str) -> Option<usize> {
    match s {
        "un" | "une" => Some(1),
        "deux" => Some(2),
        "trois" => Some(3),
        "quatre" => Some(4),
        "cinq" => Some(5),
        "six" => Some(6),
        "sept" => Some(7),
        "huit" => Some(8),
        "neuf" => Some(9),
        "dix" => Some(10),
        digits => digits.parse().ok(),
    }
}

// ── Word scan ───────────────────────────────────────────────────────────────

const EXCLUSION_WORDS: &[&str] = &["sauf", "pas", "hors", "excepte", "sans"];
const ARTICLES: &[&str] = &["le", "les", "la", "l"];
/// Words allowed between a day and its period: "vendredi en soiree", "lundi dans l apres midi".
const PERIOD_LINKS: &[&str] = &["au", "le", "en", "dans", "l", "la", "de", "du"];

fn scan_words(words: &[&str], c: &mut TemporalConstraintSet) {
    let mut months: Vec<u32> = Vec::new();
    let mut consumed = vec![false; words.len()];
    let mut i = 0;

    while i < words.len() {
        if consumed[i] {
            i += 1;
            continue;
        }
        let word = words[i];

        if let Some((weekday, plural)) = parse_weekday(word) {
            if is_excluded(words, i) {
                if !c.excluded_weekdays.contains(&weekday) {
                    c.excluded_weekdays.push(weekday);
                }
            } else if !names_date(words, i + 1) {
                let period = bind_period(words, i + 1, &mut consumed);
                c.weekdays.push(WeekdayMention {
                    weekday,
                    period,
                    plural,
                });
            }
            i += 1;
            continue;
        }

        // "15 mars", "1er mars 2026"
        if let Some(day) = parse_day_of_month(word) {
            if let Some(month) = words.get(i + 1).and_then(|w| parse_month(w)) {
                let year = words.get(i + 2).and_then(|w| parse_year(w));
                let skip = if year.is_some() { 3 } else { 2 };
                for flag in consumed.iter_mut().skip(i).take(skip) {
                    *flag = true;
                }
                let period = bind_period(words, i + skip, &mut consumed);
                c.dates.push(DateMention {
                    date: DateRef::Calendar { day, month, year },
                    period,
                });
                i += skip;
                continue;
            }
        }

        match word {
            "aujourd" if words.get(i + 1) == Some(&"hui") => {
                consumed[i + 1] = true;
                push_relative(words, i + 2, 0, c, &mut consumed);
                i += 2;
                continue;
            }
            "demain" => {
                let offset = if i > 0 && words[i - 1] == "apres" { 2 } else { 1 };
                push_relative(words, i + 1, offset, c, &mut consumed);
            }
            // "ce soir"
            "ce" if matches!(words.get(i + 1), Some(&"soir") | Some(&"soiree")) => {
                consumed[i + 1] = true;
                c.dates.push(DateMention {
                    date: DateRef::Relative(0),
                    period: Some(DayPeriod::Evening),
                });
                i += 2;
                continue;
            }
            "weekend" | "weekends" => c.weekend = true,
            "week" if matches!(words.get(i + 1), Some(&"end") | Some(&"ends")) => {
                c.weekend = true;
                i += 2;
                continue;
            }
            "semaine" => {
                let prev = if i > 0 { words[i - 1] } else { "" };
                let next = words.get(i + 1).copied().unwrap_or("");
                if prev == "en" {
                    c.working_days = true;
                } else if next == "prochaine" || prev == "prochaine" {
                    c.week_scope = Some(WeekScope::Next);
                } else if prev == "cette" {
                    c.week_scope = Some(WeekScope::This);
                }
            }
            "tous" | "toutes" if words.get(i + 1) == Some(&"les") => c.recurring = true,
            "chaque" | "hebdomadaire" | "hebdo" => c.recurring = true,
            "urgent" | "urgente" | "urgence" | "asap" | "rapidement" | "vite" => c.urgent = true,
            "possible" if i > 1 && words[i - 1] == "que" && words[i - 2] == "des" => c.urgent = true,
            "tot" if i > 0 && words[i - 1] == "plus" => c.urgent = true,
            _ => {
                if let Some(month) = parse_month(word) {
                    months.push(month);
                    if let Some(year) = words.get(i + 1).and_then(|w| parse_year(w)) {
                        c.month.get_or_insert(MonthAnchor {
                            start_month: month,
                            end_month: month,
                            year: None,
                        });
                        if let Some(anchor) = c.month.as_mut() {
                            anchor.year.get_or_insert(year);
                        }
                        consumed[i + 1] = true;
                    }
                } else if let Some((period, len)) = period_at(words, i) {
                    if !c.periods.contains(&period) {
                        c.periods.push(period);
                    }
                    i += len;
                    continue;
                }
            }
        }
        i += 1;
    }

    if let (Some(&first), Some(&last)) = (months.first(), months.last()) {
        let year = c.month.and_then(|m| m.year);
        c.month = Some(MonthAnchor {
            start_month: first,
            end_month: last,
            year,
        });
    }
}

fn push_relative(
    words: &[&str],
    next: usize,
    offset: i64,
    c: &mut TemporalConstraintSet,
    consumed: &mut [bool],
) {
    let period = bind_period(words, next, consumed);
    c.dates.push(DateMention {
        date: DateRef::Relative(offset),
        period,
    });
}

/// A day of month and a month at `start`, after an optional "le": the weekday
/// before it ("lundi 23 mars") only qualifies that date.
fn names_date(words: &[&str], start: usize) -> bool {
    let j = if words.get(start) == Some(&"le") { start + 1 } else { start };
    words.get(j).and_then(|w| parse_day_of_month(w)).is_some()
        && words.get(j + 1).and_then(|w| parse_month(w)).is_some()
}

/// A weekday preceded by "sauf", "pas le", "hors", ...
fn is_excluded(words: &[&str], i: usize) -> bool {
    let mut j = i;
    while j > 0 {
        j -= 1;
        if ARTICLES.contains(&words[j]) {
            continue;
        }
        return EXCLUSION_WORDS.contains(&words[j]);
    }
    false
}

/// The period written at `start` (after optional link words), marking its
/// words consumed.
fn bind_period(words: &[&str], start: usize, consumed: &mut [bool]) -> Option<DayPeriod> {
    let mut j = start;
    while j < words.len() && PERIOD_LINKS.contains(&words[j]) && j < start + 2 {
        j += 1;
    }
    let (period, len) = period_at(words, j)?;
    for flag in consumed.iter_mut().skip(start).take(j + len - start) {
        *flag = true;
    }
    Some(period)
}

/// Period word(s) at `i`, with the number of words they span.
fn period_at(words: &[&str], i: usize) -> Option<(DayPeriod, usize)> {
    match *words.get(i)? {
        "matin" | "matins" | "matinee" | "matinees" => Some((DayPeriod::Morning, 1)),
        "apres" if words.get(i + 1) == Some(&"midi") => Some((DayPeriod::Afternoon, 2)),
        "aprem" | "apresmidi" => Some((DayPeriod::Afternoon, 1)),
        "midi" | "dejeuner" => Some((DayPeriod::Noon, 1)),
        "soir" | "soirs" | "soiree" | "soirees" | "diner" => Some((DayPeriod::Evening, 1)),
        _ => None,
    }
}

/// The weekday, and whether it was written in the plural ("lundis").
fn parse_weekday(word: &str) -> Option<(Weekday, bool)> {
    let (stem, plural) = match word.strip_suffix('s') {
        Some(stem) => (stem, true),
        None => (word, false),
    };
    let weekday = match stem {
        "lundi" => Weekday::Mon,
        "mardi" => Weekday::Tue,
        "mercredi" => Weekday::Wed,
        "jeudi" => Weekday::Thu,
        "vendredi" => Weekday::Fri,
        "samedi" => Weekday::Sat,
        "dimanche" => Weekday::Sun,
        _ => return None,
    };
    Some((weekday, plural))
}

fn parse_month(word: &str) -> Option<u32> {
    match word {
        "janvier" | "janv" => Some(1),
        "fevrier" | "fevr" | "fev" => Some(2),
        "mars" => Some(3),
        "avril" | "avr" => Some(4),
        "mai" => Some(5),
        "juin" => Some(6),
        "juillet" | "juil" => Some(7),
        "aout" => Some(8),
        "septembre" => Some(9),
        "octobre" | "oct" => Some(10),
        "novembre" | "nov" => Some(11),
        "decembre" | "dec" => Some(12),
        _ => None,
    }
}

fn parse_day_of_month(word: &str) -> Option<u32> {
    let digits = word.strip_suffix("er").unwrap_or(word);
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let day: u32 = digits.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

fn parse_year(word: &str) -> Option<i32> {
    if word.len() != 4 {
        return None;
    }
    let year: i32 = word.parse().ok()?;
    (2000..=2100).contains(&year).then_some(year)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn mention(weekday: Weekday, period: Option<DayPeriod>) -> WeekdayMention {
        WeekdayMention {
            weekday,
            period,
            plural: false,
        }
    }

    #[test]
    fn test_weekday_with_bound_period() {
        let c = extract_constraints("Réunion lundi matin");
        assert_eq!(c.weekdays, vec![mention(Weekday::Mon, Some(DayPeriod::Morning))]);
        assert!(c.periods.is_empty());
        assert!(!c.recurring);
    }

    #[test]
    fn test_two_days_each_with_own_period() {
        let c = extract_constraints("vendredi soir ou samedi matin");
        assert_eq!(
            c.weekdays,
            vec![
                mention(Weekday::Fri, Some(DayPeriod::Evening)),
                mention(Weekday::Sat, Some(DayPeriod::Morning)),
            ]
        );
        assert!(!c.weekend);
    }

    #[test]
    fn test_recurring_weekday_in_month_with_year() {
        let c = extract_constraints("tous les samedis de mars 2026");
        assert!(c.recurring);
        assert_eq!(
            c.weekdays,
            vec![WeekdayMention {
                weekday: Weekday::Sat,
                period: None,
                plural: true,
            }]
        );
        assert_eq!(
            c.month,
            Some(MonthAnchor {
                start_month: 3,
                end_month: 3,
                year: Some(2026)
            })
        );
    }

    #[test]
    fn test_afternoon_is_not_noon() {
        let c = extract_constraints("un créneau l'après-midi");
        assert_eq!(c.periods, vec![DayPeriod::Afternoon]);

        let c = extract_constraints("jeudi apres midi");
        assert_eq!(c.weekdays, vec![mention(Weekday::Thu, Some(DayPeriod::Afternoon))]);

        let c = extract_constraints("déjeuner à midi");
        assert_eq!(c.periods, vec![DayPeriod::Noon]);
    }

    #[test]
    fn test_period_link_words() {
        let c = extract_constraints("mardi en soirée");
        assert_eq!(c.weekdays, vec![mention(Weekday::Tue, Some(DayPeriod::Evening))]);
        let c = extract_constraints("mercredi dans l'après-midi");
        assert_eq!(c.weekdays, vec![mention(Weekday::Wed, Some(DayPeriod::Afternoon))]);
    }

    #[test]
    fn test_free_standing_periods() {
        let c = extract_constraints("plutôt le matin ou le soir");
        assert_eq!(c.periods, vec![DayPeriod::Morning, DayPeriod::Evening]);
        assert!(c.weekdays.is_empty());
    }

    #[test]
    fn test_weekend_markers() {
        assert!(extract_constraints("ce week-end").weekend);
        assert!(extract_constraints("un weekend de juin").weekend);
        assert!(extract_constraints("le week end prochain").weekend);
    }

    #[test]
    fn test_excluded_weekdays() {
        let c = extract_constraints("en semaine sauf le mercredi");
        assert_eq!(c.excluded_weekdays, vec![Weekday::Wed]);
        assert!(c.working_days);
        assert!(c.weekdays.is_empty());

        let c = extract_constraints("pas le lundi, plutôt mardi");
        assert_eq!(c.excluded_weekdays, vec![Weekday::Mon]);
        assert_eq!(c.weekdays, vec![mention(Weekday::Tue, None)]);
    }

    #[test]
    fn test_recurrence_markers() {
        assert!(extract_constraints("chaque jeudi").recurring);
        assert!(extract_constraints("toutes les semaines le mardi").recurring);
        assert!(!extract_constraints("lundi").recurring);
    }

    #[test]
    fn test_urgency_markers() {
        assert!(extract_constraints("c'est urgent, demain").urgent);
        assert!(extract_constraints("dès que possible").urgent);
        assert!(extract_constraints("au plus tôt").urgent);
        assert!(!extract_constraints("mardi").urgent);
    }

    #[test]
    fn test_month_range() {
        let c = extract_constraints("les samedis de mars à mai");
        assert_eq!(
            c.month,
            Some(MonthAnchor {
                start_month: 3,
                end_month: 5,
                year: None
            })
        );
    }

    #[test]
    fn test_week_scope() {
        assert_eq!(
            extract_constraints("la semaine prochaine").week_scope,
            Some(WeekScope::Next)
        );
        assert_eq!(
            extract_constraints("cette semaine").week_scope,
            Some(WeekScope::This)
        );
    }

    #[test]
    fn test_explicit_dates() {
        let c = extract_constraints("le 15 mars ou le 1er avril 2027");
        assert_eq!(
            c.dates,
            vec![
                DateMention {
                    date: DateRef::Calendar { day: 15, month: 3, year: None },
                    period: None
                },
                DateMention {
                    date: DateRef::Calendar { day: 1, month: 4, year: Some(2027) },
                    period: None
                },
            ]
        );
        // Months consumed by dates are not a month anchor.
        assert_eq!(c.month, None);

        let c = extract_constraints("le 2026-05-04 ou le 12/05");
        assert_eq!(c.dates.len(), 2);
    }

    #[test]
    fn test_relative_days() {
        let c = extract_constraints("demain matin");
        assert_eq!(
            c.dates,
            vec![DateMention {
                date: DateRef::Relative(1),
                period: Some(DayPeriod::Morning)
            }]
        );
        let c = extract_constraints("après-demain");
        assert_eq!(c.dates[0].date, DateRef::Relative(2));
        assert!(c.periods.is_empty());
        let c = extract_constraints("aujourd'hui ou ce soir");
        assert_eq!(c.dates[0].date, DateRef::Relative(0));
        assert_eq!(c.dates[1].period, Some(DayPeriod::Evening));
    }

    #[test]
    fn test_time_ranges() {
        let c = extract_constraints("mardi de 14h à 16h30");
        assert_eq!(c.time_range, Some(TimeWindow::new(t(14, 0), t(16, 30))));
        assert_eq!(c.start_time, None);

        let c = extract_constraints("jeudi 9h-11h");
        assert_eq!(c.time_range, Some(TimeWindow::new(t(9, 0), t(11, 0))));

        let c = extract_constraints("entre 10:00 et 12:00");
        assert_eq!(c.time_range, Some(TimeWindow::new(t(10, 0), t(12, 0))));
    }

    #[test]
    fn test_start_time() {
        let c = extract_constraints("lundi à 10h30");
        assert_eq!(c.start_time, Some(t(10, 30)));
        assert_eq!(c.duration_minutes, None);
    }

    #[test]
    fn test_durations() {
        assert_eq!(extract_constraints("réunion d'une heure").duration_minutes, Some(60));
        assert_eq!(extract_constraints("pendant 1h30").duration_minutes, Some(90));
        assert_eq!(extract_constraints("un point de 45 minutes").duration_minutes, Some(45));
        assert_eq!(extract_constraints("une demi-heure").duration_minutes, Some(30));
        assert_eq!(extract_constraints("2 heures le matin").duration_minutes, Some(120));
        assert_eq!(extract_constraints("réunion de 2h mardi").duration_minutes, Some(120));
        assert_eq!(extract_constraints("deux heures et demie").duration_minutes, Some(150));
    }

    #[test]
    fn test_short_bare_hours_are_durations() {
        let c = extract_constraints("réunion d'1h lundi matin");
        assert_eq!(c.duration_minutes, Some(60));
        assert_eq!(c.start_time, None);

        let c = extract_constraints("un point 1h30 jeudi");
        assert_eq!(c.duration_minutes, Some(90));
        assert_eq!(c.start_time, None);
    }

    #[test]
    fn test_cued_or_late_hours_are_start_times() {
        let c = extract_constraints("mardi à 2h");
        assert_eq!(c.start_time, Some(t(2, 0)));
        assert_eq!(c.duration_minutes, None);

        let c = extract_constraints("jeudi 18h");
        assert_eq!(c.start_time, Some(t(18, 0)));
        assert_eq!(c.duration_minutes, None);

        let c = extract_constraints("lundi à 10h pendant 1h");
        assert_eq!(c.start_time, Some(t(10, 0)));
        assert_eq!(c.duration_minutes, Some(60));
    }

    #[test]
    fn test_weekday_before_date_is_not_a_separate_day() {
        let c = extract_constraints("réunion lundi 23 mars");
        assert!(c.weekdays.is_empty());
        assert_eq!(
            c.dates,
            vec![DateMention {
                date: DateRef::Calendar { day: 23, month: 3, year: None },
                period: None
            }]
        );

        let c = extract_constraints("vendredi 20/03 le soir");
        assert!(c.weekdays.is_empty());
        assert_eq!(c.dates.len(), 1);
    }

    #[test]
    fn test_plural_weekday_is_marked() {
        let c = extract_constraints("les lundis d'avril");
        assert!(c.weekdays[0].plural);
        assert!(c.repeats());
        assert!(!c.recurring);

        let c = extract_constraints("un lundi en avril");
        assert!(!c.weekdays[0].plural);
        assert!(!c.repeats());
    }

    #[test]
    fn test_de_with_late_hour_is_start_time() {
        let c = extract_constraints("mardi de 9h");
        assert_eq!(c.duration_minutes, None);
        assert_eq!(c.start_time, Some(t(9, 0)));
    }

    #[test]
    fn test_occurrence_counts() {
        let c = extract_constraints("les 3 prochains lundis");
        assert_eq!(c.occurrence_count, Some(3));
        assert!(!c.recurring);

        let c = extract_constraints("le jeudi pendant six semaines");
        assert_eq!(c.occurrence_count, Some(6));
        assert!(c.recurring);
    }

    #[test]
    fn test_noise_yields_empty_set() {
        assert!(extract_constraints("blablabla xyz qwerty").is_empty());
        assert!(extract_constraints("").is_empty());
    }
}
