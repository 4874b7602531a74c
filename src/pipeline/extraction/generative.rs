use super::cloud::CloudClient;
use super::ollama::OllamaClient;
use super::parser::parse_fact_response;
use super::prompt::{build_extraction_prompt, requested_fields, EXTRACTION_SYSTEM_PROMPT};
use super::types::{CategorizedFields, LlmClient};
use super::{ExtractionError, ExtractionOutcome, LlmError};
use crate::config::{LlmBackend, LlmSettings};
use crate::models::{ExtractionSource, FactMap};

/// Primary extractor: prompt → language model → fact map.
///
/// Exactly one backend call per extraction. Any failure surfaces as an
/// `ExtractionError`; nothing partial is returned.
pub struct GenerativeExtractor {
    llm: Box<dyn LlmClient>,
}

impl GenerativeExtractor {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Construct the backend chosen by the runtime switch.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let llm: Box<dyn LlmClient> = match settings.backend {
            LlmBackend::Cloud => Box::new(CloudClient::new(
                &settings.cloud_base_url,
                &settings.cloud_model,
                settings.cloud_api_key.as_deref(),
                settings.temperature,
            )?),
            LlmBackend::Local => Box::new(OllamaClient::new(
                &settings.ollama_host,
                &settings.local_model,
                settings.temperature,
            )?),
        };
        tracing::info!(backend = %llm.describe(), "Generative extractor configured");
        Ok(Self::new(llm))
    }

    pub fn backend(&self) -> String {
        self.llm.describe()
    }

    pub fn extract(
        &self,
        text: &str,
        prior_facts: &FactMap,
        categorized: &CategorizedFields,
    ) -> Result<FactMap, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }
        let requested = requested_fields(categorized);
        if requested.is_empty() {
            return Err(ExtractionError::NoFields);
        }

        let prompt = build_extraction_prompt(text, prior_facts, categorized);
        let response = self.llm.generate(&prompt, EXTRACTION_SYSTEM_PROMPT)?;
        let facts = parse_fact_response(&response, self.llm.response_mode(), &requested)?;

        tracing::debug!(
            backend = %self.llm.describe(),
            requested = requested.len(),
            "Generative extraction parsed"
        );
        Ok(facts)
    }

    /// `extract` folded into an explicit outcome.
    pub fn attempt(
        &self,
        text: &str,
        prior_facts: &FactMap,
        categorized: &CategorizedFields,
    ) -> ExtractionOutcome {
        ExtractionOutcome::from_result(
            self.extract(text, prior_facts, categorized),
            ExtractionSource::Generative,
        )
    }
}
