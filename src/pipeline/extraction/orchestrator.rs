use super::generative::GenerativeExtractor;
use super::rules::RuleExtractor;
use super::types::FactExtractor;
use super::ExtractionOutcome;
use crate::models::{ExtractionSource, FactMap};
use crate::pipeline::catalog::FieldCatalog;

/// Facts produced by one pipeline run and the backend that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub facts: FactMap,
    pub source: ExtractionSource,
    /// Why the primary backend was skipped, when it was.
    pub fallback_reason: Option<String>,
}

/// Primary-then-fallback extraction.
///
/// Each backend is attempted at most once per call. When the generative
/// attempt fails, the rule extractor's output is returned unmodified; the
/// two outputs are never blended.
pub struct ExtractionPipeline {
    generative: Option<GenerativeExtractor>,
    rules: RuleExtractor,
    catalog: FieldCatalog,
}

impl ExtractionPipeline {
    pub fn new(generative: GenerativeExtractor, rules: RuleExtractor, catalog: FieldCatalog) -> Self {
        Self {
            generative: Some(generative),
            rules,
            catalog,
        }
    }

    /// Pipeline without a primary backend: every call goes to the rules.
    pub fn rules_only(rules: RuleExtractor, catalog: FieldCatalog) -> Self {
        Self {
            generative: None,
            rules,
            catalog,
        }
    }

    /// Swap in a rebuilt rule extractor (after the rule table changed).
    pub fn with_rules(mut self, rules: RuleExtractor) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &RuleExtractor {
        &self.rules
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn has_generative(&self) -> bool {
        self.generative.is_some()
    }

    pub fn run(&self, text: &str, prior_facts: &FactMap, fields: &[String]) -> PipelineOutput {
        let span = tracing::info_span!("extraction", fields = fields.len());
        let _guard = span.enter();

        let reason = match &self.generative {
            Some(generative) => {
                let categorized = self.catalog.classify(fields);
                match generative.attempt(text, prior_facts, &categorized) {
                    ExtractionOutcome::Success { facts, source } => {
                        tracing::info!(source = %source, facts = facts.len(), "Extraction complete");
                        return PipelineOutput {
                            facts,
                            source,
                            fallback_reason: None,
                        };
                    }
                    ExtractionOutcome::Failure { reason } => {
                        tracing::warn!(
                            backend = %generative.backend(),
                            reason = %reason,
                            "Generative extraction failed, falling back to rules"
                        );
                        reason
                    }
                }
            }
            None => "no generative backend configured".to_string(),
        };

        let facts = self.rules.extract(text, fields);
        tracing::info!(
            source = %ExtractionSource::Rules,
            facts = facts.len(),
            table_version = self.rules.table_version(),
            "Extraction complete"
        );
        PipelineOutput {
            facts,
            source: ExtractionSource::Rules,
            fallback_reason: Some(reason),
        }
    }
}

impl FactExtractor for ExtractionPipeline {
    fn extract_facts(&self, text: &str, prior: &FactMap, fields: &[String]) -> FactMap {
        self.run(text, prior, fields).facts
    }
}
