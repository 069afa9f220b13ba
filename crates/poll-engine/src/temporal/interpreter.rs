//! The scheduling-request pipeline.
//!
//! [`TemporalRequestInterpreter`] chains extraction, consistency checking,
//! date enumeration and slot generation into a [`PollSuggestion`]. An
//! optional [`SuggestionModel`] may then reword the title and narrow the
//! dates, never widen them.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};

use super::constraints::fold;
use super::{
    check_consistency, enumerate_dates, extract_constraints, generate_time_slots,
    ConsistencyReport, PollSuggestion, TemporalConstraintSet, TimeSlot,
};
use crate::calendar::{CalendarLookup, RruleCalendar};
use crate::config::InterpreterConfig;
use crate::error::{PollError, Result};
use crate::model::{ModelError, ModelSuggestion, PromptContext, SuggestionModel};

/// Title used when the request names no recognizable event.
pub const DEFAULT_TITLE: &str = "Sondage de dates";

const MAX_TITLE_CHARS: usize = 120;

/// Folded keyword → poll title.
const EVENT_TITLES: &[(&str, &str)] = &[
    ("reunion", "Réunion"),
    ("dejeuner", "Déjeuner"),
    ("diner", "Dîner"),
    ("apero", "Apéro"),
    ("aperitif", "Apéro"),
    ("afterwork", "Afterwork"),
    ("entretien", "Entretien"),
    ("rendez", "Rendez-vous"),
    ("rdv", "Rendez-vous"),
    ("point", "Point"),
    ("anniversaire", "Anniversaire"),
    ("formation", "Formation"),
    ("atelier", "Atelier"),
    ("match", "Match"),
];

/// Every stage of one interpretation, for `--explain` output and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub constraints: TemporalConstraintSet,
    pub report: ConsistencyReport,
    pub suggestion: PollSuggestion,
}

/// Turns French scheduling requests into [`PollSuggestion`]s.
///
/// Collaborators are injected; the interpreter holds no global state and is
/// cheap to clone.
#[derive(Clone)]
pub struct TemporalRequestInterpreter {
    config: InterpreterConfig,
    calendar: Arc<dyn CalendarLookup>,
    model: Option<Arc<dyn SuggestionModel>>,
}

impl Default for TemporalRequestInterpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default(), Arc::new(RruleCalendar::new()))
    }
}

impl TemporalRequestInterpreter {
    pub fn new(config: InterpreterConfig, calendar: Arc<dyn CalendarLookup>) -> Self {
        Self {
            config,
            calendar,
            model: None,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn SuggestionModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// "Today" for `now` in the configured timezone.
    pub fn today(&self, now: DateTime<Utc>) -> Result<NaiveDate> {
        today_in(now, &self.config.timezone)
    }

    /// Run the four deterministic stages.
    ///
    /// # Errors
    ///
    /// [`PollError::UnparseableRequest`] when the utterance has no temporal
    /// content, [`PollError::NoFutureDates`] when every matching date is
    /// before `today`.
    pub fn interpret(&self, utterance: &str, today: NaiveDate) -> Result<Interpretation> {
        let constraints = extract_constraints(utterance);
        debug!(constraints = %constraints.describe(), "extracted constraints");

        let report = check_consistency(&constraints);
        if !report.is_clean() {
            debug!(
                conflicts = ?report.conflicts,
                suggestions = ?report.suggestions,
                "consistency findings"
            );
        }

        let candidates =
            enumerate_dates(&constraints, today, &self.config, self.calendar.as_ref())?;
        let time_slots = generate_time_slots(&candidates, &constraints, &self.config);
        debug!(
            dates = candidates.len(),
            slots = time_slots.len(),
            "generated suggestion"
        );

        let dates = candidates.iter().map(|c| c.date).collect();
        Ok(Interpretation {
            constraints,
            report,
            suggestion: PollSuggestion::new(title_for(utterance), dates, time_slots),
        })
    }

    /// Deterministic suggestion for `utterance`.
    pub fn generate(&self, utterance: &str, today: NaiveDate) -> Result<PollSuggestion> {
        Ok(self.interpret(utterance, today)?.suggestion)
    }

    /// Deterministic suggestion refined by the configured model.
    ///
    /// The model may reword the title and narrow the dates to a subset of the
    /// deterministic ones; anything else it proposes is discarded. Without a
    /// model this is [`generate`](Self::generate).
    ///
    /// # Errors
    ///
    /// Same as [`interpret`](Self::interpret), plus
    /// [`PollError::UpstreamGeneration`] once `model_attempts` answers were
    /// unusable.
    pub async fn generate_assisted(
        &self,
        utterance: &str,
        today: NaiveDate,
    ) -> Result<PollSuggestion> {
        let interpretation = self.interpret(utterance, today)?;
        let Some(model) = &self.model else {
            return Ok(interpretation.suggestion);
        };

        let mut prompt = PromptContext {
            utterance: utterance.to_string(),
            today,
            constraints: interpretation.constraints.describe(),
            conflicts: interpretation.report.conflicts.clone(),
            suggestions: interpretation.report.suggestions.clone(),
            candidate_dates: interpretation.suggestion.dates.clone(),
            strict: false,
        };

        let mut last_error = ModelError::Provider("no model attempt made".to_string());
        for attempt in 1..=self.config.model_attempts {
            let outcome = match model.suggest(&prompt).await {
                Ok(raw) => raw
                    .parse()
                    .and_then(|proposal| clamp(&interpretation.suggestion, proposal, today)),
                Err(err) => Err(err),
            };
            match outcome {
                Ok(suggestion) => return Ok(suggestion),
                Err(err) => {
                    warn!(attempt, error = %err, "model suggestion unusable");
                    last_error = err;
                }
            }
            prompt.strict = true;
        }
        Err(PollError::from(last_error))
    }
}

/// Resolve the calendar date of `now` in the IANA zone `timezone`.
pub fn today_in(now: DateTime<Utc>, timezone: &str) -> Result<NaiveDate> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| PollError::InvalidTimezone(format!("'{timezone}'")))?;
    Ok(now.with_timezone(&tz).date_naive())
}

fn title_for(utterance: &str) -> String {
    let folded = fold(utterance);
    folded
        .split(|ch: char| !ch.is_alphanumeric())
        .find_map(|word| {
            EVENT_TITLES
                .iter()
                .find(|(keyword, _)| *keyword == word)
                .map(|(_, title)| title.to_string())
        })
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Keep from `proposal` only what the deterministic result allows.
fn clamp(
    base: &PollSuggestion,
    proposal: ModelSuggestion,
    today: NaiveDate,
) -> std::result::Result<PollSuggestion, ModelError> {
    let title = proposal
        .title
        .map(|t| t.trim().chars().take(MAX_TITLE_CHARS).collect::<String>())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| base.title.clone());

    if proposal.dates.is_empty() {
        return Ok(PollSuggestion::new(title, base.dates.clone(), base.time_slots.clone()));
    }

    let allowed: BTreeSet<NaiveDate> = base.dates.iter().copied().collect();
    let accepted: BTreeSet<NaiveDate> = proposal
        .dates
        .iter()
        .filter_map(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
        .filter(|d| *d >= today && allowed.contains(d))
        .collect();
    if accepted.is_empty() {
        return Err(ModelError::Parse(
            "proposal kept none of the candidate dates".to_string(),
        ));
    }
    if accepted.len() < proposal.dates.len() {
        debug!(
            proposed = proposal.dates.len(),
            accepted = accepted.len(),
            "discarded model dates outside the candidate set"
        );
    }

    let time_slots = base
        .time_slots
        .iter()
        .filter_map(|slot| {
            let dates: Vec<NaiveDate> = slot
                .dates
                .iter()
                .copied()
                .filter(|d| accepted.contains(d))
                .collect();
            (!dates.is_empty()).then(|| TimeSlot {
                start: slot.start,
                end: slot.end,
                dates,
            })
        })
        .collect();

    Ok(PollSuggestion::new(title, accepted.into_iter().collect(), time_slots))
}
