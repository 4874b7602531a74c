//! Multi-turn observation state handed to a downstream diagnostic engine.

use serde::{Deserialize, Serialize};

use crate::models::{ExtractionSource, FactMap, Schema};
use crate::pipeline::extraction::{ExtractionError, ExtractionPipeline};
use crate::pipeline::merge;

/// One ranked identification returned by a diagnostic engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub taxon: String,
    /// Percent match over the fields supplied so far.
    pub confidence: f64,
    /// Percent match over every schema field.
    pub true_confidence: f64,
    pub reasoning: String,
    pub next_tests: Vec<String>,
    pub notes: String,
}

/// Consumer of the accumulated fact map. Implemented outside this crate.
pub trait DiagnosticEngine {
    fn identify(&self, facts: &FactMap) -> Vec<Identification>;
}

/// What one observation turn contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub turn: usize,
    pub source: ExtractionSource,
    pub extracted: FactMap,
    pub fallback_reason: Option<String>,
}

/// Accumulated facts for one conversation.
pub struct ObservationSession<'a> {
    pipeline: &'a ExtractionPipeline,
    schema: Schema,
    facts: FactMap,
    turns: usize,
}

impl<'a> ObservationSession<'a> {
    pub fn new(pipeline: &'a ExtractionPipeline, schema: Schema) -> Self {
        Self::with_prior(pipeline, schema, FactMap::new())
    }

    pub fn with_prior(pipeline: &'a ExtractionPipeline, schema: Schema, prior: FactMap) -> Self {
        let facts = schema.restrict(prior);
        Self {
            pipeline,
            schema,
            facts,
            turns: 0,
        }
    }

    pub fn facts(&self) -> &FactMap {
        &self.facts
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Extract from `text` and merge into the accumulated facts.
    pub fn observe(&mut self, text: &str) -> Result<TurnReport, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }
        let fields = self.schema.extractable_fields();
        let output = self.pipeline.run(text, &self.facts, &fields);
        let extracted = self.schema.restrict(output.facts);

        self.facts = merge(&self.facts, &extracted);
        self.turns += 1;
        tracing::info!(
            turn = self.turns,
            source = %output.source,
            extracted = extracted.len(),
            accumulated = self.facts.len(),
            "Observation merged"
        );

        Ok(TurnReport {
            turn: self.turns,
            source: output.source,
            extracted,
            fallback_reason: output.fallback_reason,
        })
    }

    pub fn identify(&self, engine: &dyn DiagnosticEngine) -> Vec<Identification> {
        engine.identify(&self.facts)
    }

    pub fn reset(&mut self) {
        self.facts.clear();
        self.turns = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fact_map, Outcome};
    use crate::pipeline::extraction::{GenerativeExtractor, MockLlmClient, RuleExtractor};
    use crate::pipeline::FieldCatalog;

    fn schema() -> Schema {
        Schema::new(
            "Genus",
            ["Genus", "Gram Stain", "Shape", "Oxidase", "Catalase"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    struct TopMatch;

    impl DiagnosticEngine for TopMatch {
        fn identify(&self, facts: &FactMap) -> Vec<Identification> {
            let taxon = if facts.get("Oxidase") == Some(&Outcome::Positive) {
                "Pseudomonas"
            } else {
                "Escherichia"
            };
            vec![Identification {
                taxon: taxon.into(),
                confidence: 100.0,
                true_confidence: facts.len() as f64 / 4.0 * 100.0,
                reasoning: String::new(),
                next_tests: vec![],
                notes: String::new(),
            }]
        }
    }

    #[test]
    fn end_to_end_rules_path() {
        let pipeline = ExtractionPipeline::rules_only(RuleExtractor::new(), FieldCatalog::default());
        let mut session = ObservationSession::new(&pipeline, schema());
        let report = session
            .observe("Gram negative rod, oxidase positive, catalase negative")
            .unwrap();
        assert_eq!(report.source, ExtractionSource::Rules);
        assert_eq!(
            session.facts(),
            &fact_map([
                ("Gram Stain", "Negative"),
                ("Shape", "Rods"),
                ("Oxidase", "Positive"),
                ("Catalase", "Negative"),
            ])
        );
    }

    #[test]
    fn later_unknowns_keep_earlier_definites() {
        let llm = MockLlmClient::new(
            r#"{"Gram Stain": "Unknown", "Shape": "Unknown", "Oxidase": "Unknown", "Catalase": "Positive"}"#,
        );
        let pipeline = ExtractionPipeline::new(
            GenerativeExtractor::new(Box::new(llm)),
            RuleExtractor::new(),
            FieldCatalog::default(),
        );
        let prior = fact_map([("Oxidase", "Positive"), ("Genus", "Pseudomonas")]);
        let mut session = ObservationSession::with_prior(&pipeline, schema(), prior);
        assert!(!session.facts().contains_key("Genus"));

        session.observe("catalase positive").unwrap();
        assert_eq!(session.facts()["Oxidase"], Outcome::Positive);
        assert_eq!(session.facts()["Catalase"], Outcome::Positive);
        assert_eq!(session.facts()["Shape"], Outcome::Unknown);
        assert_eq!(session.turns(), 1);
    }

    #[test]
    fn facts_are_handed_to_engine() {
        let pipeline = ExtractionPipeline::rules_only(RuleExtractor::new(), FieldCatalog::default());
        let mut session = ObservationSession::new(&pipeline, schema());
        session.observe("oxidase positive").unwrap();
        let ranked = session.identify(&TopMatch);
        assert_eq!(ranked[0].taxon, "Pseudomonas");
        assert_eq!(ranked[0].true_confidence, 25.0);
    }

    #[test]
    fn blank_turn_is_rejected_without_state_change() {
        let pipeline = ExtractionPipeline::rules_only(RuleExtractor::new(), FieldCatalog::default());
        let mut session = ObservationSession::new(&pipeline, schema());
        assert!(matches!(session.observe("  "), Err(ExtractionError::EmptyInput)));
        assert_eq!(session.turns(), 0);
    }

    #[test]
    fn reset_clears_accumulated_facts() {
        let pipeline = ExtractionPipeline::rules_only(RuleExtractor::new(), FieldCatalog::default());
        let mut session = ObservationSession::new(&pipeline, schema());
        session.observe("catalase negative").unwrap();
        session.reset();
        assert!(session.facts().is_empty());
        assert_eq!(session.turns(), 0);
    }
}
