//! Observation → fact extraction.
//!
//! Two backends produce the same fact-map contract:
//! - `GenerativeExtractor`: prompt + external language model (primary)
//! - `RuleExtractor`: deterministic patterns (fallback, target of learning)
//!
//! `ExtractionPipeline` tries the first and falls back to the second. The
//! choice is an explicit `ExtractionOutcome` branch, never an unwound error.

pub mod types;
pub mod sanitize;
pub mod prompt;
pub mod parser;
pub mod ollama;
pub mod cloud;
pub mod generative;
pub mod rule_table;
pub mod rules;
pub mod orchestrator;

pub use types::*;
pub use sanitize::*;
pub use prompt::*;
pub use parser::*;
pub use ollama::*;
pub use cloud::*;
pub use generative::*;
pub use rule_table::*;
pub use rules::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::models::{ExtractionSource, FactMap};

/// Transport/backend failures talking to a language-model service.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM backend is not reachable at {0}")]
    Connection(String),

    #[error("LLM backend returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("LLM backend rejected credentials")]
    Authentication,

    #[error("Missing API key for cloud backend")]
    MissingApiKey,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response decoding error: {0}")]
    ResponseDecoding(String),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Observation text is empty")]
    EmptyInput,

    #[error("No fields requested for extraction")]
    NoFields,
}

#[derive(Error, Debug)]
pub enum RuleTableError {
    #[error("Rule table has no version line")]
    MissingVersion,

    #[error("Rule table version is not a number: {0}")]
    InvalidVersion(String),

    #[error("Rule table must contain exactly one learned-rules marker, found {0}")]
    MarkerCount(usize),

    #[error("Malformed rule on line {line}: {content}")]
    MalformedLine { line: usize, content: String },

    #[error("Invalid pattern for field '{field}': {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one extraction attempt: either a usable fact map tagged with
/// the backend that produced it, or the reason the attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Success {
        facts: FactMap,
        source: ExtractionSource,
    },
    Failure {
        reason: String,
    },
}

impl ExtractionOutcome {
    pub fn from_result(result: Result<FactMap, ExtractionError>, source: ExtractionSource) -> Self {
        match result {
            Ok(facts) => ExtractionOutcome::Success { facts, source },
            Err(e) => ExtractionOutcome::Failure {
                reason: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fact_map;

    #[test]
    fn outcome_from_ok_carries_source() {
        let outcome = ExtractionOutcome::from_result(
            Ok(fact_map([("Oxidase", "Positive")])),
            ExtractionSource::Generative,
        );
        match outcome {
            ExtractionOutcome::Success { facts, source } => {
                assert_eq!(source, ExtractionSource::Generative);
                assert_eq!(facts.len(), 1);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn outcome_from_err_keeps_reason() {
        let outcome = ExtractionOutcome::from_result(
            Err(ExtractionError::Llm(LlmError::Authentication)),
            ExtractionSource::Generative,
        );
        assert!(!outcome.is_success());
        if let ExtractionOutcome::Failure { reason } = outcome {
            assert!(reason.contains("credentials"));
        }
    }
}
