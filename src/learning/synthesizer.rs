use super::types::HeuristicCandidate;
use crate::pipeline::extraction::{format_rule_line, RuleTable, RuleTableError};

/// Indicator alternation appended to every learned rule.
pub const INDICATOR_GROUP: &str = r"\W*(positive|negative|detected|produced)";

/// Canonical pattern for `field`: the escaped lower-cased name followed by
/// an outcome indicator. Spaces are escaped as `\ `, except before
/// "fermentation" where any whitespace run is accepted.
pub fn rule_literal(field: &str) -> String {
    let name = field.trim().to_lowercase();
    let escaped = regex::escape(&name).replace(' ', r"\ ");
    let corrected = escaped.replace(r"\ fermentation", r"\s+fermentation");
    format!("{corrected}{INDICATOR_GROUP}")
}

/// Insert rules for every candidate not already present in `table`.
///
/// Pure: returns the new table and the number of rules added. With nothing
/// new, the returned table is byte-identical to the input.
pub fn apply(
    candidates: &[HeuristicCandidate],
    table: &RuleTable,
) -> Result<(RuleTable, usize), RuleTableError> {
    let mut fresh: Vec<String> = Vec::new();
    for candidate in candidates {
        let line = format_rule_line(&candidate.field, &rule_literal(&candidate.field));
        if table.contains_text(&line) || fresh.contains(&line) {
            tracing::debug!(field = %candidate.field, "Rule already present");
            continue;
        }
        fresh.push(line);
    }

    let updated = table.with_learned_lines(&fresh)?;
    if !fresh.is_empty() {
        tracing::info!(
            added = fresh.len(),
            version = updated.version(),
            "Synthesized learned rules"
        );
    }
    Ok((updated, fresh.len()))
}
