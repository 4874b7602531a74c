use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Observed outcome of a single laboratory test.
///
/// Serialized as its display string so fact maps stay plain
/// `{"Oxidase": "Positive"}` JSON on disk and on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Outcome {
    Positive,
    Negative,
    Variable,
    Unknown,
    /// Free categorical value for multi-valued fields ("Rods", "Beta", ...).
    Label(String),
}

impl Outcome {
    /// Parse a raw value. Canonical words are matched case-insensitively,
    /// anything else non-blank becomes a `Label`. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Outcome> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let outcome = match trimmed.to_lowercase().as_str() {
            "positive" | "+" => Outcome::Positive,
            "negative" | "-" => Outcome::Negative,
            "variable" => Outcome::Variable,
            "unknown" => Outcome::Unknown,
            _ => Outcome::Label(trimmed.to_string()),
        };
        Some(outcome)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Positive => "Positive",
            Outcome::Negative => "Negative",
            Outcome::Variable => "Variable",
            Outcome::Unknown => "Unknown",
            Outcome::Label(label) => label,
        }
    }

    /// Positive or Negative: the outcomes merging must never degrade.
    pub fn is_definite(&self) -> bool {
        matches!(self, Outcome::Positive | Outcome::Negative)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Outcome {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Outcome::parse(&value).ok_or(ModelError::BlankOutcome)
    }
}

impl From<Outcome> for String {
    fn from(value: Outcome) -> Self {
        value.as_str().to_string()
    }
}

/// Field name → observed outcome. Ordered so serialized maps are stable.
pub type FactMap = BTreeMap<String, Outcome>;

/// Build a fact map from `(field, value)` pairs, skipping blank values.
pub fn fact_map<'a, I>(pairs: I) -> FactMap
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .filter_map(|(field, value)| Outcome::parse(value).map(|o| (field.to_string(), o)))
        .collect()
}
