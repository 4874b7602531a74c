//! Deterministic pattern extractor: the fallback backend.
//!
//! Per field, in order:
//! 1. leading negation ("no urease", "does not produce indole") → Negative
//! 2. field name followed (same clause) by a positive indicator → Positive
//! 3. field name followed (same clause) by a negative indicator → Negative
//!
//! Then learned rules from the rule table, then the Gram-stain and
//! cell-shape special cases, which override everything for their field.

use std::sync::LazyLock;

use regex::Regex;

use super::rule_table::{outcome_for_indicator, RuleTable};
use super::sanitize::{normalize_field_name, normalize_observation_text};
use super::types::FactExtractor;
use super::RuleTableError;
use crate::models::{FactMap, Outcome};

static POSITIVE_INDICATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:positive|detected|produced)\b|\+").unwrap());

static NEGATIVE_INDICATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:negative|not detected|absent)\b|-").unwrap());

static GRAM_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bgram[\s-]+(positive|negative|variable)\b").unwrap());

/// Shape phrases in priority order ("short rod" before "rod").
static SHAPE_PHRASES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"\bshort[\s-]+rods?\b").unwrap(), "Short Rods"),
        (Regex::new(r"cocc(?:i|us)\b").unwrap(), "Cocci"),
        (Regex::new(r"\brods?\b|bacill(?:i|us)\b").unwrap(), "Rods"),
        (Regex::new(r"\bspiral").unwrap(), "Spiral"),
    ]
});

/// Phrases that negate a field name placed right after them.
const LEADING_NEGATIONS: &[&str] = &[
    "does not produce ",
    "did not produce ",
    "no production of ",
    "absence of ",
    "lack of ",
    "non-",
    "no ",
];

/// Learned rule compiled from the rule table.
struct CompiledRule {
    field: String,
    regex: Regex,
}

/// Pattern-based extractor bound to one rule-table version.
pub struct RuleExtractor {
    learned: Vec<CompiledRule>,
    table_version: u32,
}

impl Default for RuleExtractor {
    fn default() -> Self {
        Self {
            learned: Vec::new(),
            table_version: RuleTable::seed().version(),
        }
    }
}

impl RuleExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every rule in `table`. Fails on the first invalid pattern.
    pub fn from_table(table: &RuleTable) -> Result<Self, RuleTableError> {
        let learned = table
            .rules()
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| CompiledRule {
                        field: rule.field.clone(),
                        regex,
                    })
                    .map_err(|e| RuleTableError::InvalidPattern {
                        field: rule.field.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            version = table.version(),
            learned = learned.len(),
            "Rule extractor loaded rule table"
        );
        Ok(Self {
            learned,
            table_version: table.version(),
        })
    }

    pub fn table_version(&self) -> u32 {
        self.table_version
    }

    pub fn learned_rule_count(&self) -> usize {
        self.learned.len()
    }

    /// Extract facts for `fields`. Fields with no signal are omitted.
    pub fn extract(&self, text: &str, fields: &[String]) -> FactMap {
        let normalized = normalize_observation_text(text);
        let mut facts = FactMap::new();
        if normalized.is_empty() {
            return facts;
        }

        for field in fields {
            let name = normalize_field_name(field);
            if name.is_empty() {
                continue;
            }
            if let Some(outcome) = generic_outcome(&normalized, &name) {
                set_field_safe(&mut facts, field, outcome);
            }
        }

        for rule in &self.learned {
            let Some(field) = fields.iter().find(|f| f.eq_ignore_ascii_case(&rule.field)) else {
                continue;
            };
            let outcome = rule
                .regex
                .captures(&normalized)
                .and_then(|caps| caps.get(1))
                .and_then(|m| outcome_for_indicator(m.as_str()));
            if let Some(outcome) = outcome {
                set_field_safe(&mut facts, field, outcome);
            }
        }

        apply_special_cases(&normalized, fields, &mut facts);
        facts
    }
}

impl FactExtractor for RuleExtractor {
    fn extract_facts(&self, text: &str, _prior: &FactMap, fields: &[String]) -> FactMap {
        self.extract(text, fields)
    }
}

/// Write `value` only if the field is unset, currently `Variable`, or the
/// value differs. Returns whether the map changed.
pub fn set_field_safe(facts: &mut FactMap, field: &str, value: Outcome) -> bool {
    let should_write = match facts.get(field) {
        None => true,
        Some(Outcome::Variable) => true,
        Some(current) => *current != value,
    };
    if should_write {
        facts.insert(field.to_string(), value);
    }
    should_write
}

/// Byte offsets just past each whole-word mention of `name` in `text`,
/// paired with the mention start.
fn field_mentions(text: &str, name: &str) -> Vec<(usize, usize)> {
    text.match_indices(name)
        .filter(|(start, _)| {
            let end = start + name.len();
            let before_ok = text[..*start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let after_ok = text[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
            before_ok && after_ok
        })
        .map(|(start, _)| (start, start + name.len()))
        .collect()
}

/// Text after a mention, up to the end of its clause.
///
/// Indicators are only searched inside the mention's own clause, so one
/// field's result cannot bleed into the next ("oxidase, catalase positive").
/// Phrasing that puts the result past a clause break is left to the learned
/// rules, which may span punctuation.
fn clause_tail(text: &str, from: usize) -> &str {
    let rest = &text[from..];
    match rest.find(&[',', ';', '.'][..]) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

fn has_positive_indicator(tail: &str) -> bool {
    POSITIVE_INDICATOR.find_iter(tail).any(|m| {
        // "not detected" is a negative indicator.
        !(m.as_str() == "detected" && tail[..m.start()].ends_with("not "))
    })
}

/// `head` ends with `phrase`, and `phrase` starts on a word boundary.
fn ends_with_phrase(head: &str, phrase: &str) -> bool {
    head.ends_with(phrase)
        && head[..head.len() - phrase.len()]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
}

fn generic_outcome(text: &str, name: &str) -> Option<Outcome> {
    let mentions = field_mentions(text, name);

    for &(start, _) in &mentions {
        let head = &text[..start];
        if LEADING_NEGATIONS.iter().any(|neg| ends_with_phrase(head, neg)) {
            return Some(Outcome::Negative);
        }
    }

    for &(_, end) in &mentions {
        let tail = clause_tail(text, end);
        if has_positive_indicator(tail) {
            return Some(Outcome::Positive);
        }
        if NEGATIVE_INDICATOR.is_match(tail) {
            return Some(Outcome::Negative);
        }
    }

    None
}

fn apply_special_cases(text: &str, fields: &[String], facts: &mut FactMap) {
    for field in fields {
        let name = normalize_field_name(field);

        if name.contains("gram") {
            let gram = GRAM_PHRASE
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| match m.as_str() {
                    "positive" => Outcome::Positive,
                    "negative" => Outcome::Negative,
                    _ => Outcome::Variable,
                });
            if let Some(outcome) = gram {
                facts.insert(field.clone(), outcome);
            }
        } else if name.contains("shape") {
            let shape = SHAPE_PHRASES
                .iter()
                .find(|(regex, _)| regex.is_match(text))
                .map(|(_, label)| Outcome::Label((*label).to_string()));
            if let Some(outcome) = shape {
                facts.insert(field.clone(), outcome);
            }
        }
    }
}
