//! Conditional question visibility.
//!
//! A form declares rules of the shape
//! `{ questionId, dependsOn, showIf: { operator, value? } }`. A question is
//! shown when every rule that targets it holds for the respondent's current
//! answers; a question with no rule is always shown.
//!
//! Evaluation never fails. Unknown operators and rules missing their
//! comparator evaluate to `false`, so a broken rule hides its question rather
//! than breaking the form. The same holds on the wire: an operator or value
//! of an unexpected JSON type still deserializes, into a rule that fails
//! closed.
//!
//! # Functions
//!
//! - [`evaluate_rule`] — one rule against the answer map
//! - [`should_show_question`] — AND of every rule targeting a question
//! - [`visible_question_ids`] — ordered ids of the questions to render
//! - [`clean_hidden_answers`] — drop answers to questions that are no longer visible

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

// ── Rule model ──────────────────────────────────────────────────────────────

/// Comparison applied to the answer of the `dependsOn` question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Value>", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    IsEmpty,
    IsNotEmpty,
    /// An operator this engine does not know, kept as written so the rule
    /// serializes back unchanged. Empty when the operator was missing.
    Unknown(String),
}

impl Operator {
    fn is_missing(&self) -> bool {
        matches!(self, Operator::Unknown(raw) if raw.is_empty())
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Unknown(String::new())
    }
}

impl From<Option<Value>> for Operator {
    fn from(raw: Option<Value>) -> Self {
        let name = match raw {
            None | Some(Value::Null) => return Operator::default(),
            Some(Value::String(name)) => name,
            Some(other) => return Operator::Unknown(other.to_string()),
        };
        match name.as_str() {
            "equals" => Operator::Equals,
            "notEquals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "isEmpty" => Operator::IsEmpty,
            "isNotEmpty" => Operator::IsNotEmpty,
            _ => Operator::Unknown(name),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Equals => "equals".to_string(),
            Operator::NotEquals => "notEquals".to_string(),
            Operator::Contains => "contains".to_string(),
            Operator::IsEmpty => "isEmpty".to_string(),
            Operator::IsNotEmpty => "isNotEmpty".to_string(),
            Operator::Unknown(raw) => raw,
        }
    }
}

/// Expected value of a rule: a single string or a list of strings.
///
/// Only the first element of a list is ever compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    One(String),
    Many(Vec<String>),
}

impl RuleValue {
    /// The comparator actually used by `equals`, `notEquals` and `contains`.
    pub fn comparator(&self) -> Option<&str> {
        match self {
            RuleValue::One(s) => Some(s.as_str()),
            RuleValue::Many(values) => values.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowIf {
    #[serde(default, skip_serializing_if = "Operator::is_missing")]
    pub operator: Operator,
    #[serde(
        default,
        deserialize_with = "lenient_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<RuleValue>,
}

/// A `value` that is neither a string nor a list of strings reads as missing.
fn lenient_value<'de, D>(deserializer: D) -> Result<Option<RuleValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            debug!(error = %err, "ignoring rule value of unexpected type");
            Ok(None)
        }
    }
}

/// Gates the visibility of `question_id` on the answer given to `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    pub question_id: String,
    pub depends_on: String,
    #[serde(default)]
    pub show_if: ShowIf,
}

impl ConditionalRule {
    pub fn new(
        question_id: impl Into<String>,
        depends_on: impl Into<String>,
        operator: Operator,
        value: Option<RuleValue>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            depends_on: depends_on.into(),
            show_if: ShowIf { operator, value },
        }
    }
}

/// A respondent's answer: one choice / free text, or a multi-select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

impl Answer {
    fn values(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Answer::Single(s) => Box::new(std::iter::once(s.as_str())),
            Answer::Multiple(values) => Box::new(values.iter().map(String::as_str)),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Answer::Single(s) => s.is_empty(),
            Answer::Multiple(values) => values.is_empty(),
        }
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Answer::Single(s.to_string())
    }
}

impl From<Vec<&str>> for Answer {
    fn from(values: Vec<&str>) -> Self {
        Answer::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Question id → current answer.
pub type AnswerMap = BTreeMap<String, Answer>;

/// The part of a form question the visibility engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

impl Question {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
        }
    }
}

// ── Evaluation ──────────────────────────────────────────────────────────────

/// Evaluate a single rule against the current answers.
///
/// # Examples
///
/// ```
/// use poll_engine::conditions::{evaluate_rule, AnswerMap, ConditionalRule, Operator, RuleValue};
///
/// let rule = ConditionalRule::new("q3", "q2", Operator::Equals, Some(RuleValue::One("Oui".into())));
/// let mut answers = AnswerMap::new();
/// answers.insert("q2".into(), "  oui ".into());
/// assert!(evaluate_rule(&rule, &answers));
/// ```
pub fn evaluate_rule(rule: &ConditionalRule, answers: &AnswerMap) -> bool {
    let answer = answers.get(&rule.depends_on);
    let comparator = rule.show_if.value.as_ref().and_then(RuleValue::comparator);

    match &rule.show_if.operator {
        Operator::IsEmpty => answer.is_none_or(Answer::is_empty),
        Operator::IsNotEmpty => answer.is_some_and(|a| !a.is_empty()),
        Operator::Equals => match (answer, comparator) {
            (Some(a), Some(expected)) => equals_match(a, expected),
            _ => false,
        },
        Operator::NotEquals => match (answer, comparator) {
            (Some(a), Some(expected)) => !equals_match(a, expected),
            _ => false,
        },
        Operator::Contains => match (answer, comparator) {
            (Some(a), Some(needle)) => contains_match(a, needle),
            _ => false,
        },
        Operator::Unknown(raw) => {
            debug!(
                question_id = %rule.question_id,
                depends_on = %rule.depends_on,
                operator = %raw,
                "unknown rule operator, hiding question"
            );
            false
        }
    }
}

/// Whether `question_id` should be rendered.
///
/// Every rule targeting the question must hold. Questions without rules are
/// visible.
pub fn should_show_question(
    question_id: &str,
    rules: &[ConditionalRule],
    answers: &AnswerMap,
) -> bool {
    rules
        .iter()
        .filter(|rule| rule.question_id == question_id)
        .all(|rule| evaluate_rule(rule, answers))
}

/// Ids of the questions to render, in form order.
pub fn visible_question_ids(
    questions: &[Question],
    rules: &[ConditionalRule],
    answers: &AnswerMap,
) -> Vec<String> {
    questions
        .iter()
        .filter(|q| should_show_question(&q.id, rules, answers))
        .map(|q| q.id.clone())
        .collect()
}

/// Keep only answers to visible questions.
///
/// Must run right before a response is stored or submitted, so answers given
/// to a question that a later answer hid never leave the client.
pub fn clean_hidden_answers(answers: &AnswerMap, visible_ids: &[String]) -> AnswerMap {
    let visible: HashSet<&str> = visible_ids.iter().map(String::as_str).collect();
    answers
        .iter()
        .filter(|(id, _)| visible.contains(id.as_str()))
        .map(|(id, answer)| (id.clone(), answer.clone()))
        .collect()
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn equals_match(answer: &Answer, expected: &str) -> bool {
    let expected = normalize(expected);
    answer.values().any(|v| normalize(v) == expected)
}

fn contains_match(answer: &Answer, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    answer.values().any(|v| v.to_lowercase().contains(&needle))
}

// ── Tests ───────────────────────────────────────────────────────────────────
