use std::path::Path;

use serde::{Deserialize, Serialize};

use super::facts::FactMap;
use super::ModelError;

/// Default name of the identifying taxon column.
pub const DEFAULT_TAXON_FIELD: &str = "Genus";

/// Snapshot of the test schema: the taxon column plus every test column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default = "default_taxon_field")]
    pub taxon_field: String,
    pub fields: Vec<String>,
}

fn default_taxon_field() -> String {
    DEFAULT_TAXON_FIELD.to_string()
}

impl Schema {
    pub fn new(taxon_field: &str, fields: Vec<String>) -> Self {
        Self {
            taxon_field: taxon_field.to_string(),
            fields,
        }
    }

    /// Load a schema document (`{"taxon_field": ..., "fields": [...]}`).
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::SchemaNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let schema: Schema = serde_json::from_str(&data)
            .map_err(|e| ModelError::SchemaParsing(e.to_string()))?;
        if schema.extractable_fields().is_empty() {
            return Err(ModelError::SchemaParsing("schema declares no test fields".into()));
        }
        Ok(schema)
    }

    /// Declared fields minus the taxon field, order preserved, blanks dropped.
    pub fn extractable_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case(&self.taxon_field))
            .map(str::to_string)
            .collect()
    }

    /// Drop keys that are not extractable schema fields.
    pub fn restrict(&self, facts: FactMap) -> FactMap {
        let allowed = self.extractable_fields();
        facts
            .into_iter()
            .filter(|(field, _)| allowed.iter().any(|a| a == field))
            .collect()
    }
}
