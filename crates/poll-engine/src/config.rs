//! Interpreter configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! The period boundary table (matin, midi, après-midi, soir) and the 30-minute
//! slot granularity are fixed.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{PollError, Result};
use crate::temporal::TimeWindow;

/// Which day begins a week for "cette semaine" / "la semaine prochaine".
///
/// Does **not** affect named-weekday expressions like "lundi" or "tous les samedis".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// ISO 8601 (Monday = day 0 of the week).
    Monday,
    /// Sunday = day 0 of the week.
    #[default]
    Sunday,
}

impl WeekStartDay {
    /// How many days `weekday` is from the week-start day.
    pub fn days_from_start(self, weekday: Weekday) -> i64 {
        match self {
            WeekStartDay::Monday => weekday.num_days_from_monday() as i64,
            WeekStartDay::Sunday => weekday.num_days_from_sunday() as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub week_start: WeekStartDay,
    /// Occurrences per weekday for "tous les lundis" without a month or count.
    pub default_occurrences: usize,
    /// Days searched when the request names a time of day but no day.
    pub default_horizon_days: i64,
    /// Upper bound on the number of dates in one suggestion.
    pub max_dates: usize,
    pub max_slots_per_day: usize,
    /// Slot length for an explicit start time without a duration.
    pub default_slot_minutes: u32,
    /// Window used when a duration is given without any time of day.
    pub business_hours: TimeWindow,
    /// IANA timezone used to resolve "today" from an instant.
    pub timezone: String,
    /// Model calls per assisted generation, the first included.
    pub model_attempts: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStartDay::Sunday,
            default_occurrences: 4,
            default_horizon_days: 7,
            max_dates: 40,
            max_slots_per_day: 8,
            default_slot_minutes: 60,
            business_hours: TimeWindow::new(hm(9, 0), hm(18, 0)),
            timezone: "Europe/Paris".to_string(),
            model_attempts: 2,
        }
    }
}

impl InterpreterConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: InterpreterConfig = serde_json::from_str(json)
            .map_err(|e| PollError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_occurrences == 0 {
            return Err(PollError::InvalidConfig(
                "default_occurrences must be at least 1".to_string(),
            ));
        }
        if self.default_horizon_days <= 0 {
            return Err(PollError::InvalidConfig(
                "default_horizon_days must be positive".to_string(),
            ));
        }
        if self.max_dates == 0 || self.max_slots_per_day == 0 {
            return Err(PollError::InvalidConfig(
                "max_dates and max_slots_per_day must be at least 1".to_string(),
            ));
        }
        if self.default_slot_minutes == 0 {
            return Err(PollError::InvalidConfig(
                "default_slot_minutes must be positive".to_string(),
            ));
        }
        if self.business_hours.start >= self.business_hours.end {
            return Err(PollError::InvalidConfig(format!(
                "business_hours start {} is not before end {}",
                self.business_hours.start.format("%H:%M"),
                self.business_hours.end.format("%H:%M")
            )));
        }
        if self.model_attempts == 0 {
            return Err(PollError::InvalidConfig(
                "model_attempts must be at least 1".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| PollError::InvalidTimezone(format!("'{}'", self.timezone)))
    }

    /// The calendar date of `now` in the configured timezone.
    pub fn today_at(&self, now: DateTime<Utc>) -> Result<NaiveDate> {
        crate::temporal::today_in(now, &self.timezone)
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_json_is_default() {
        let config = InterpreterConfig::from_json_str("{}").unwrap();
        assert_eq!(config, InterpreterConfig::default());
        assert_eq!(config.week_start, WeekStartDay::Sunday);
    }

    #[test]
    fn test_partial_override() {
        let config = InterpreterConfig::from_json_str(
            r#"{"week_start":"monday","max_dates":10,"business_hours":{"start":"10:00","end":"16:30"}}"#,
        )
        .unwrap();
        assert_eq!(config.week_start, WeekStartDay::Monday);
        assert_eq!(config.max_dates, 10);
        assert_eq!(config.business_hours.end, hm(16, 30));
        assert_eq!(config.default_occurrences, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = InterpreterConfig::from_json_str(r#"{"max_dates":0}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid config"), "got: {err}");

        let err = InterpreterConfig::from_json_str(
            r#"{"business_hours":{"start":"18:00","end":"09:00"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PollError::InvalidConfig(_)));

        let err = InterpreterConfig::from_json_str(r#"{"timezone":"Mars/Olympus"}"#).unwrap_err();
        assert!(matches!(err, PollError::InvalidTimezone(_)));
    }

    #[test]
    fn test_today_at_uses_configured_timezone() {
        let config = InterpreterConfig::default();
        // 23:30 UTC on March 14 is already March 15 in Paris.
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 23, 30, 0).unwrap();
        assert_eq!(
            config.today_at(now).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_days_from_week_start() {
        assert_eq!(WeekStartDay::Sunday.days_from_start(Weekday::Sun), 0);
        assert_eq!(WeekStartDay::Sunday.days_from_start(Weekday::Sat), 6);
        assert_eq!(WeekStartDay::Monday.days_from_start(Weekday::Sun), 6);
    }
}
