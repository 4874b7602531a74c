use std::collections::BTreeMap;

use super::LlmError;
use crate::models::{FactMap, FieldCategory};

/// Fields grouped by catalog category, categories in precedence order.
pub type CategorizedFields = BTreeMap<FieldCategory, Vec<String>>;

/// How a backend delivers its JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Structured-response mode: the body is the JSON object itself.
    JsonObject,
    /// Free text with an embedded JSON object somewhere inside.
    FreeText,
}

/// Language-model client abstraction (allows mocking).
///
/// One blocking call per extraction; implementations must not retry.
pub trait LlmClient {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError>;

    fn response_mode(&self) -> ResponseMode;

    /// Short label for logs ("ollama:llama3.1", "cloud:gpt-4o-mini").
    fn describe(&self) -> String;
}

/// Anything that turns one observation into facts over a field list.
///
/// The evaluator scores through this seam so it can drive either the full
/// pipeline or a single deterministic extractor.
pub trait FactExtractor {
    fn extract_facts(&self, text: &str, prior: &FactMap, fields: &[String]) -> FactMap;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        fn _assert_client(_: &dyn LlmClient) {}
        fn _assert_extractor(_: &dyn FactExtractor) {}
    }
}
