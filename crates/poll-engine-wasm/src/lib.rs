//! WASM bindings for poll-engine.
//!
//! Every function takes and returns JSON strings so the browser side needs no
//! generated type definitions. Errors surface as `JsError` carrying the
//! engine's message.

use chrono::NaiveDate;
use poll_engine::{
    clean_hidden_answers as clean, should_show_question as show, visible_question_ids as visible,
    AnswerMap, ConditionalRule, Question, TemporalRequestInterpreter,
};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

/// Ids of the questions to render.
///
/// `questions`: `[{ "id": ... }]`, `rules`: `[ConditionalRule]`, `answers`:
/// `{ questionId: string | string[] }`. Returns a JSON array of ids.
#[wasm_bindgen]
pub fn visible_question_ids(questions: &str, rules: &str, answers: &str) -> Result<String, JsError> {
    let questions: Vec<Question> = from_json(questions, "questions")?;
    let rules: Vec<ConditionalRule> = from_json(rules, "rules")?;
    let answers: AnswerMap = from_json(answers, "answers")?;
    to_json(&visible(&questions, &rules, &answers))
}

#[wasm_bindgen]
pub fn should_show_question(question_id: &str, rules: &str, answers: &str) -> Result<bool, JsError> {
    let rules: Vec<ConditionalRule> = from_json(rules, "rules")?;
    let answers: AnswerMap = from_json(answers, "answers")?;
    Ok(show(question_id, &rules, &answers))
}

/// `answers` restricted to `visible_ids` (a JSON array of ids).
#[wasm_bindgen]
pub fn clean_hidden_answers(answers: &str, visible_ids: &str) -> Result<String, JsError> {
    let answers: AnswerMap = from_json(answers, "answers")?;
    let ids: Vec<String> = from_json(visible_ids, "visible ids")?;
    to_json(&clean(&answers, &ids))
}

/// Deterministic poll suggestion for a French request. `today` is
/// `YYYY-MM-DD` in the user's local calendar.
#[wasm_bindgen]
pub fn suggest_poll(text: &str, today: &str) -> Result<String, JsError> {
    let today = parse_today(today)?;
    let suggestion = TemporalRequestInterpreter::default()
        .generate(text, today)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_json(&suggestion)
}

fn parse_today(today: &str) -> Result<NaiveDate, JsError> {
    NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d")
        .map_err(|e| JsError::new(&format!("Invalid date '{today}': {e}")))
}

fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, JsError> {
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid {what}: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}
