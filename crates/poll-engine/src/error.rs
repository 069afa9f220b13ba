//! Error types for poll-engine operations.
//!
//! Rule evaluation has no error type: malformed rules fail closed (hidden
//! question) instead of surfacing here.

use thiserror::Error;

use crate::model::ModelError;

#[derive(Error, Debug)]
pub enum PollError {
    #[error("No future dates: {0}")]
    NoFutureDates(String),

    #[error("Unparseable request: {0}")]
    UnparseableRequest(String),

    #[error("Upstream generation failed: {0}")]
    UpstreamGeneration(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

impl From<ModelError> for PollError {
    fn from(err: ModelError) -> Self {
        PollError::UpstreamGeneration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            PollError::NoFutureDates("all candidates before 2026-03-01".into()).to_string(),
            "No future dates: all candidates before 2026-03-01"
        );
        assert_eq!(
            PollError::UnparseableRequest("'blah'".into()).to_string(),
            "Unparseable request: 'blah'"
        );
    }

    #[test]
    fn test_model_error_converts_to_upstream() {
        let err: PollError = ModelError::Timeout.into();
        assert!(matches!(err, PollError::UpstreamGeneration(_)));
        assert_eq!(err.to_string(), "Upstream generation failed: model timed out");
    }
}
