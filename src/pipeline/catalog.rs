use std::path::Path;

use serde::{Deserialize, Serialize};

use super::extraction::types::CategorizedFields;
use super::CatalogError;
use crate::models::FieldCategory;

/// Declarative keyword table. Checked Morphology → Enzyme → Fermentation;
/// the first category with a keyword contained in the field name wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    #[serde(default)]
    pub morphology: Vec<String>,
    #[serde(default)]
    pub enzyme: Vec<String>,
    #[serde(default)]
    pub fermentation: Vec<String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            morphology: owned(&[
                "gram", "shape", "morphology", "motility", "motile", "capsule", "spore",
                "flagell", "colony", "pigment", "haemolysis", "hemolysis", "arrangement",
            ]),
            enzyme: owned(&[
                "oxidase", "catalase", "urease", "coagulase", "lipase", "dnase", "gelatin",
                "esculin", "hydrolysis", "decarboxylase", "dihydrolase", "deaminase",
                "nitrate", "reductase", "phosphatase", "galactosidase", "onpg", "indole",
            ]),
            fermentation: owned(&[
                "fermentation", "glucose", "lactose", "sucrose", "mannitol", "maltose",
                "xylose", "arabinose", "sorbitol", "raffinose", "rhamnose", "trehalose",
                "inositol", "acid from", "citrate", "utilization",
            ]),
        }
    }
}

impl KeywordTable {
    fn keywords_for(&self, category: FieldCategory) -> &[String] {
        match category {
            FieldCategory::Morphology => &self.morphology,
            FieldCategory::Enzyme => &self.enzyme,
            FieldCategory::Fermentation => &self.fermentation,
            FieldCategory::Other => &[],
        }
    }
}

/// Classifies schema field names into catalog categories.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    keywords: KeywordTable,
}

impl FieldCatalog {
    pub fn new(keywords: KeywordTable) -> Self {
        Self { keywords }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let keywords: KeywordTable =
            serde_json::from_str(json).map_err(|e| CatalogError::Parsing(e.to_string()))?;
        Ok(Self::new(keywords))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    pub fn category_of(&self, field: &str) -> FieldCategory {
        let name = field.to_lowercase();
        FieldCategory::all()
            .iter()
            .copied()
            .find(|cat| {
                self.keywords
                    .keywords_for(*cat)
                    .iter()
                    .any(|kw| !kw.is_empty() && name.contains(&kw.to_lowercase()))
            })
            .unwrap_or(FieldCategory::Other)
    }

    /// Group `fields` by category. Every category is present (possibly
    /// empty) and each keeps the input order.
    pub fn classify(&self, fields: &[String]) -> CategorizedFields {
        let mut out: CategorizedFields = FieldCategory::all()
            .iter()
            .map(|cat| (*cat, Vec::new()))
            .collect();
        for field in fields {
            out.entry(self.category_of(field))
                .or_default()
                .push(field.clone());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classify_common_fields() {
        let catalog = FieldCatalog::default();
        let groups = catalog.classify(&names(&[
            "Gram Stain",
            "Shape",
            "Oxidase",
            "Catalase",
            "Glucose Fermentation",
            "Growth at 42C",
        ]));
        assert_eq!(groups[&FieldCategory::Morphology], names(&["Gram Stain", "Shape"]));
        assert_eq!(groups[&FieldCategory::Enzyme], names(&["Oxidase", "Catalase"]));
        assert_eq!(groups[&FieldCategory::Fermentation], names(&["Glucose Fermentation"]));
        assert_eq!(groups[&FieldCategory::Other], names(&["Growth at 42C"]));
    }

    #[test]
    fn morphology_wins_over_enzyme() {
        let catalog = FieldCatalog::default();
        assert_eq!(catalog.category_of("Colony Catalase Reaction"), FieldCategory::Morphology);
    }

    #[test]
    fn enzyme_wins_over_fermentation() {
        let catalog = FieldCatalog::default();
        assert_eq!(catalog.category_of("Glucose Oxidase"), FieldCategory::Enzyme);
    }

    #[test]
    fn all_categories_present_even_when_empty() {
        let groups = FieldCatalog::default().classify(&[]);
        assert_eq!(groups.len(), 4);
        assert!(groups.values().all(Vec::is_empty));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(FieldCatalog::default().category_of("UREASE"), FieldCategory::Enzyme);
    }

    #[test]
    fn custom_table_from_json() {
        let catalog = FieldCatalog::from_json_str(r#"{"enzyme": ["growth"]}"#).unwrap();
        assert_eq!(catalog.category_of("Growth at 42C"), FieldCategory::Enzyme);
        assert_eq!(catalog.category_of("Gram Stain"), FieldCategory::Other);
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            FieldCatalog::from_json_str("{not json"),
            Err(CatalogError::Parsing(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, r#"{"fermentation": ["sugar"]}"#).unwrap();
        let catalog = FieldCatalog::load(&path).unwrap();
        assert_eq!(catalog.category_of("Sugar Use"), FieldCategory::Fermentation);
    }
}
