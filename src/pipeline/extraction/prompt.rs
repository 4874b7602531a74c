use super::types::CategorizedFields;
use crate::models::FactMap;

/// Prompt cost bound: fields listed per category.
pub const MAX_FIELDS_PER_CATEGORY: usize = 10;

pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You are a microbiology laboratory assistant. Your ONLY role is to convert a
free-text description of laboratory test observations into a JSON object that
maps test names to outcomes.

RULES (ABSOLUTE, NO EXCEPTIONS):
1. Use ONLY the test names listed in the request, spelled exactly as listed.
2. Each value is "Positive", "Negative" or "Unknown", unless the test lists
   categorical values (e.g. Shape), in which case use the observed label.
3. A test not mentioned in the observation is "Unknown".
4. NEVER guess an outcome that is not stated.
5. Output ONLY a single JSON object. No prose, no code fences.
"#;

const FEW_SHOT_EXAMPLES: &str = r#"Example 1
Tests: Gram Stain, Oxidase, Catalase, Indole
Observation: "Gram positive cocci, catalase positive, oxidase negative."
Output: {"Gram Stain": "Positive", "Oxidase": "Negative", "Catalase": "Positive", "Indole": "Unknown"}

Example 2
Tests: Motility, Urease, Lactose Fermentation
Observation: "Non-motile. Urease produced; lactose not fermented."
Output: {"Motility": "Negative", "Urease": "Positive", "Lactose Fermentation": "Negative"}"#;

/// Fields actually offered to the model: the first
/// `MAX_FIELDS_PER_CATEGORY` of each category, in category order.
pub fn requested_fields(categorized: &CategorizedFields) -> Vec<String> {
    categorized
        .values()
        .flat_map(|fields| fields.iter().take(MAX_FIELDS_PER_CATEGORY).cloned())
        .collect()
}

/// Build the extraction prompt for one observation.
pub fn build_extraction_prompt(
    text: &str,
    prior_facts: &FactMap,
    categorized: &CategorizedFields,
) -> String {
    let field_lines = categorized
        .iter()
        .filter(|(_, fields)| !fields.is_empty())
        .map(|(category, fields)| {
            let listed: Vec<&str> = fields
                .iter()
                .take(MAX_FIELDS_PER_CATEGORY)
                .map(String::as_str)
                .collect();
            format!("- {category}: {}", listed.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prior = if prior_facts.is_empty() {
        "{}".to_string()
    } else {
        serde_json::to_string(prior_facts).unwrap_or_else(|_| "{}".to_string())
    };

    format!(
        r#"{FEW_SHOT_EXAMPLES}

Now the real request.

TESTS (by category):
{field_lines}

FACTS ALREADY KNOWN FROM EARLIER MESSAGES (keep them unless the observation changes them):
{prior}

<observation>
{text}
</observation>

Output one JSON object with every test listed above as a key:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fact_map, FieldCategory};

    fn categorized(n_enzymes: usize) -> CategorizedFields {
        let mut map = CategorizedFields::new();
        map.insert(FieldCategory::Morphology, vec!["Gram Stain".into(), "Shape".into()]);
        map.insert(
            FieldCategory::Enzyme,
            (0..n_enzymes).map(|i| format!("Enzyme {i}")).collect(),
        );
        map.insert(FieldCategory::Fermentation, vec![]);
        map
    }

    #[test]
    fn prompt_contains_observation_text() {
        let prompt = build_extraction_prompt("oxidase positive", &FactMap::new(), &categorized(1));
        assert!(prompt.contains("<observation>\noxidase positive\n</observation>"));
    }

    #[test]
    fn prompt_caps_fields_per_category() {
        let prompt = build_extraction_prompt("text", &FactMap::new(), &categorized(15));
        assert!(prompt.contains("Enzyme 9"));
        assert!(!prompt.contains("Enzyme 10"));
    }

    #[test]
    fn requested_fields_follow_the_same_cap() {
        let fields = requested_fields(&categorized(15));
        assert_eq!(fields.len(), 12);
        assert_eq!(fields[0], "Gram Stain");
        assert_eq!(fields[11], "Enzyme 9");
    }

    #[test]
    fn prompt_serializes_prior_facts() {
        let prior = fact_map([("Oxidase", "Positive")]);
        let prompt = build_extraction_prompt("catalase negative", &prior, &categorized(1));
        assert!(prompt.contains(r#"{"Oxidase":"Positive"}"#));
    }

    #[test]
    fn empty_categories_are_not_listed() {
        let prompt = build_extraction_prompt("text", &FactMap::new(), &categorized(1));
        assert!(!prompt.contains("- Fermentation:"));
    }

    #[test]
    fn prompt_carries_output_contract_examples() {
        let prompt = build_extraction_prompt("text", &FactMap::new(), &categorized(1));
        assert!(prompt.contains("\"Indole\": \"Unknown\""));
        assert!(EXTRACTION_SYSTEM_PROMPT.contains("\"Unknown\""));
    }
}
