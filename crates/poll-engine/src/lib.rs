//! # poll-engine
//!
//! Deterministic core of a date-poll application.
//!
//! Two independent engines live here: conditional question visibility for
//! dynamic forms, and the interpretation of French scheduling requests
//! ("tous les samedis de mars", "vendredi soir ou samedi matin") into
//! concrete date and time-slot proposals. Calendar arithmetic is delegated to
//! RRULE expansion; a language model, when one is plugged in, may only reword
//! and narrow what the deterministic pipeline computed.
//!
//! ## Modules
//!
//! - [`conditions`] — rule evaluation, visible questions, hidden answer cleanup
//! - [`temporal`] — request → constraints → consistency → dates → time slots
//! - [`calendar`] — weekday enumeration over date ranges and month spans
//! - [`model`] — language-model boundary and a test double
//! - [`config`] — interpreter settings
//! - [`error`] — Error types

pub mod calendar;
pub mod conditions;
pub mod config;
pub mod error;
pub mod model;
pub mod temporal;

mod hhmm;

pub use calendar::{CalendarLookup, MonthSpan, RruleCalendar};
pub use conditions::{
    clean_hidden_answers, evaluate_rule, should_show_question, visible_question_ids, Answer,
    AnswerMap, ConditionalRule, Operator, Question, RuleValue, ShowIf,
};
pub use config::{InterpreterConfig, WeekStartDay};
pub use error::{PollError, Result};
pub use model::{
    parse_suggestion_json, MockSuggestionModel, ModelError, ModelSuggestion, PromptContext,
    RawSuggestion, SuggestionModel,
};
pub use temporal::{
    check_consistency, enumerate_dates, extract_constraints, generate_time_slots, today_in,
    CandidateDate, ConsistencyReport, DayPeriod, Interpretation, PollKind, PollSuggestion,
    TemporalConstraintSet, TemporalRequestInterpreter, TimeSlot, TimeWindow,
};
