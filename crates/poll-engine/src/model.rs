//! Language-model boundary.
//!
//! The interpreter can ask a [`SuggestionModel`] to word a poll title and to
//! pick among the dates it already computed. Model output is only ever a
//! proposal: the interpreter validates it against the deterministic result.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("model timed out")]
    Timeout,
    #[error("model rate limited")]
    RateLimited,
    #[error("provider error: {0}")]
    Provider(String),
    #[error("unusable model output: {0}")]
    Parse(String),
}

/// Everything the model is told about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub utterance: String,
    pub today: NaiveDate,
    /// One-line summary of the extracted constraints.
    pub constraints: String,
    pub conflicts: Vec<String>,
    pub suggestions: Vec<String>,
    /// Dates the model may choose from.
    pub candidate_dates: Vec<NaiveDate>,
    /// Set on retries after an unusable answer.
    pub strict: bool,
}

impl PromptContext {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("You help create a date poll from a French scheduling request.\n");
        out.push_str(&format!("Today is {}.\n", self.today.format("%Y-%m-%d")));
        out.push_str(&format!("Request: \"{}\"\n", self.utterance));
        out.push_str(&format!("Understood constraints: {}\n", self.constraints));
        for conflict in &self.conflicts {
            out.push_str(&format!("Conflict: {conflict}\n"));
        }
        for suggestion in &self.suggestions {
            out.push_str(&format!("Note: {suggestion}\n"));
        }
        let dates: Vec<String> = self
            .candidate_dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
        out.push_str(&format!("Candidate dates: {}\n", dates.join(", ")));
        out.push_str(
            "Answer with a JSON object {\"title\": string, \"dates\": [\"YYYY-MM-DD\", ...]}. \
             Write the title in French. Only use candidate dates.\n",
        );
        if self.strict {
            out.push_str(
                "Your previous answer could not be used. Reply with the JSON object only, \
                 no prose, no code fence.\n",
            );
        }
        out
    }
}

/// Unprocessed model answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSuggestion {
    pub text: String,
}

impl RawSuggestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn parse(&self) -> Result<ModelSuggestion, ModelError> {
        parse_suggestion_json(&self.text)
    }
}

/// The model's proposal, before validation. Dates stay strings here so a
/// single malformed entry can be dropped without rejecting the whole answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelSuggestion {
    pub title: Option<String>,
    pub dates: Vec<String>,
}

/// Parse the first JSON object in `text`, inside a code fence or not.
pub fn parse_suggestion_json(text: &str) -> Result<ModelSuggestion, ModelError> {
    let json = extract_json(text)?;
    serde_json::from_str(json).map_err(|e| ModelError::Parse(e.to_string()))
}

fn extract_json(text: &str) -> Result<&str, ModelError> {
    let body = fenced(text).unwrap_or(text);
    let start = body
        .find('{')
        .ok_or_else(|| ModelError::Parse("no JSON object found".to_string()))?;
    let end = object_end(body, start)
        .ok_or_else(|| ModelError::Parse("unbalanced JSON object".to_string()))?;
    Ok(&body[start..end])
}

fn fenced(text: &str) -> Option<&str> {
    let open = text.find("```")? + 3;
    let close = text[open..].find("```")? + open;
    let inner = &text[open..close];
    Some(inner.strip_prefix("json").unwrap_or(inner))
}

/// Byte index just past the brace closing the object opened at `start`.
fn object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;
    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escape => escape = false,
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// A pluggable text generator. Implementations talk to a hosted model; the
/// crate ships only [`MockSuggestionModel`].
#[async_trait]
pub trait SuggestionModel: Send + Sync {
    async fn suggest(&self, prompt: &PromptContext) -> Result<RawSuggestion, ModelError>;
}

/// Replays queued answers in order and records every prompt it receives.
#[derive(Debug, Default, Clone)]
pub struct MockSuggestionModel {
    responses: Arc<Mutex<VecDeque<Result<RawSuggestion, ModelError>>>>,
    prompts: Arc<Mutex<Vec<PromptContext>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockSuggestionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, response: Result<RawSuggestion, ModelError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    pub fn enqueue_text(&self, text: &str) {
        self.enqueue(Ok(RawSuggestion::new(text)));
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<PromptContext> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SuggestionModel for MockSuggestionModel {
    async fn suggest(&self, prompt: &PromptContext) -> Result<RawSuggestion, ModelError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        let next = self
            .responses
            .lock()
            .map_err(|_| ModelError::Provider("mock queue poisoned".to_string()))?
            .pop_front();
        next.unwrap_or_else(|| Err(ModelError::Provider("mock response not provided".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(strict: bool) -> PromptContext {
        PromptContext {
            utterance: "réunion lundi matin".into(),
            today: NaiveDate::from_ymd_opt(2026, 3, 11).unwrap(),
            constraints: "days: lundi matin".into(),
            conflicts: vec![],
            suggestions: vec!["offer both".into()],
            candidate_dates: vec![NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()],
            strict,
        }
    }

    #[test]
    fn render_lists_context() {
        let text = prompt(false).render();
        assert!(text.contains("Today is 2026-03-11."));
        assert!(text.contains("réunion lundi matin"));
        assert!(text.contains("Candidate dates: 2026-03-16"));
        assert!(text.contains("Note: offer both"));
        assert!(!text.contains("previous answer"));
        assert!(prompt(true).render().contains("previous answer could not be used"));
    }

    #[test]
    fn parse_plain_json() {
        let parsed = parse_suggestion_json(r#"{"title": "Réunion", "dates": ["2026-03-16"]}"#).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Réunion"));
        assert_eq!(parsed.dates, vec!["2026-03-16".to_string()]);
    }

    #[test]
    fn parse_wrapped_in_prose_and_fence() {
        let text = "Voici :\n```json\n{\"title\": \"Apéro {vendredi}\"}\n```\nBonne soirée";
        let parsed = parse_suggestion_json(text).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Apéro {vendredi}"));
        assert!(parsed.dates.is_empty());

        let parsed = parse_suggestion_json("Sure! {\"dates\": []} hope it helps").unwrap();
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(parse_suggestion_json("no json here"), Err(ModelError::Parse(_))));
        assert!(matches!(parse_suggestion_json("{\"title\": "), Err(ModelError::Parse(_))));
        assert!(matches!(
            parse_suggestion_json("{\"dates\": \"2026-03-16\"}"),
            Err(ModelError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn mock_replays_in_order() {
        let mock = MockSuggestionModel::new();
        mock.enqueue_text("{}");
        mock.enqueue(Err(ModelError::Timeout));

        assert_eq!(mock.suggest(&prompt(false)).await.unwrap().text, "{}");
        assert_eq!(mock.suggest(&prompt(true)).await, Err(ModelError::Timeout));
        assert!(matches!(
            mock.suggest(&prompt(true)).await,
            Err(ModelError::Provider(msg)) if msg.contains("not provided")
        ));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.prompts().len(), 3);
        assert!(mock.prompts()[1].strict);
    }
}
