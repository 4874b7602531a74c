use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FactMap, Outcome};

/// A labeled observation: only the keys in `expected` are scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldCase {
    pub name: String,
    pub input: String,
    pub expected: FactMap,
}

/// One scored field that disagreed with the gold label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: String,
    pub expected: Outcome,
    /// `None` when the extractor produced nothing for the field.
    pub got: Option<Outcome>,
}

/// Append-only log entry for one failing gold case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub timestamp: DateTime<Utc>,
    pub run_id: Uuid,
    pub case_name: String,
    pub input: String,
    pub mismatches: Vec<Mismatch>,
}

/// A field whose cumulative mismatch count reached the promotion threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicCandidate {
    pub field: String,
    pub rule: String,
    pub count: usize,
}

/// Result of scoring a set of gold cases.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    pub passed: usize,
    pub total: usize,
    pub records: Vec<FeedbackRecord>,
}

impl EvaluationSummary {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fact_map;

    #[test]
    fn gold_case_deserializes_partial_expectations() {
        let json = r#"{"name": "ecoli", "input": "oxidase negative", "expected": {"Oxidase": "Negative"}}"#;
        let case: GoldCase = serde_json::from_str(json).unwrap();
        assert_eq!(case.expected, fact_map([("Oxidase", "Negative")]));
    }

    #[test]
    fn blank_expected_value_is_rejected() {
        let json = r#"{"name": "x", "input": "y", "expected": {"Oxidase": ""}}"#;
        assert!(serde_json::from_str::<GoldCase>(json).is_err());
    }

    #[test]
    fn missing_got_serializes_as_null() {
        let m = Mismatch {
            field: "Oxidase".into(),
            expected: Outcome::Positive,
            got: None,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["expected"], "Positive");
        assert!(json["got"].is_null());
    }

    #[test]
    fn pass_rate_handles_empty_run() {
        let summary = EvaluationSummary {
            passed: 0,
            total: 0,
            records: Vec::new(),
        };
        assert_eq!(summary.pass_rate(), 0.0);
    }
}
