use std::collections::BTreeMap;

use super::types::{FeedbackRecord, HeuristicCandidate};

/// Cumulative mismatches a field needs before it becomes a candidate.
pub const PROMOTION_THRESHOLD: usize = 3;

/// Rule tag when the extractor mostly produced nothing for the field.
pub const TAG_MISSING_VALUE: &str = "indicator_after_name:missing";
/// Rule tag when the extractor mostly produced the wrong value.
pub const TAG_WRONG_VALUE: &str = "indicator_after_name:conflicting";

#[derive(Default)]
struct FieldTally {
    missing: usize,
    wrong: usize,
}

impl FieldTally {
    fn total(&self) -> usize {
        self.missing + self.wrong
    }
}

/// Recompute the full candidate set from the entire feedback log.
///
/// Ordered by count (descending), then field name.
pub fn learn(records: &[FeedbackRecord]) -> Vec<HeuristicCandidate> {
    let mut tallies: BTreeMap<&str, FieldTally> = BTreeMap::new();
    for mismatch in records.iter().flat_map(|r| &r.mismatches) {
        let tally = tallies.entry(mismatch.field.as_str()).or_default();
        match mismatch.got {
            None => tally.missing += 1,
            Some(_) => tally.wrong += 1,
        }
    }

    let mut candidates: Vec<HeuristicCandidate> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.total() >= PROMOTION_THRESHOLD)
        .map(|(field, tally)| {
            let rule = if tally.missing >= tally.wrong {
                TAG_MISSING_VALUE
            } else {
                TAG_WRONG_VALUE
            };
            HeuristicCandidate {
                field: field.to_string(),
                rule: rule.to_string(),
                count: tally.total(),
            }
        })
        .collect();
    candidates.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.field.cmp(&b.field)));

    for candidate in &candidates {
        tracing::info!(
            field = %candidate.field,
            count = candidate.count,
            rule = %candidate.rule,
            "Heuristic candidate promoted"
        );
    }
    candidates
}
