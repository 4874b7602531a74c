use chrono::Utc;
use uuid::Uuid;

use super::types::{EvaluationSummary, FeedbackRecord, GoldCase, Mismatch};
use crate::models::{FactMap, Outcome};
use crate::pipeline::extraction::FactExtractor;

/// Scores an extractor against gold cases.
///
/// Works through `FactExtractor`, so the full pipeline and a bare
/// `RuleExtractor` (deterministic regression runs) are interchangeable.
pub struct Evaluator<'a> {
    extractor: &'a dyn FactExtractor,
}

impl<'a> Evaluator<'a> {
    pub fn new(extractor: &'a dyn FactExtractor) -> Self {
        Self { extractor }
    }

    pub fn run(&self, cases: &[GoldCase], fields: &[String]) -> EvaluationSummary {
        let span = tracing::info_span!("evaluation", cases = cases.len());
        let _guard = span.enter();

        let run_id = Uuid::new_v4();
        let mut passed = 0;
        let mut records = Vec::new();

        for case in cases {
            let facts = self
                .extractor
                .extract_facts(&case.input, &FactMap::new(), fields);
            let mismatches = compare(&case.expected, &facts);

            if mismatches.is_empty() {
                passed += 1;
                continue;
            }
            for m in &mismatches {
                tracing::debug!(
                    case = %case.name,
                    field = %m.field,
                    expected = %m.expected,
                    got = m.got.as_ref().map_or("<missing>", |g| g.as_str()),
                    "Gold mismatch"
                );
            }
            records.push(FeedbackRecord {
                timestamp: Utc::now(),
                run_id,
                case_name: case.name.clone(),
                input: case.input.clone(),
                mismatches,
            });
        }

        tracing::info!(passed, total = cases.len(), %run_id, "Evaluation finished");
        EvaluationSummary {
            passed,
            total: cases.len(),
            records,
        }
    }
}

/// Compare only the expected keys. A missing field counts as `Unknown`.
pub fn compare(expected: &FactMap, actual: &FactMap) -> Vec<Mismatch> {
    expected
        .iter()
        .filter_map(|(field, want)| {
            let got = actual.get(field);
            let matched = match got {
                Some(value) => value == want,
                None => *want == Outcome::Unknown,
            };
            (!matched).then(|| Mismatch {
                field: field.clone(),
                expected: want.clone(),
                got: got.cloned(),
            })
        })
        .collect()
}
