use serde_json::Value;

use super::types::ResponseMode;
use super::ExtractionError;
use crate::models::{FactMap, Outcome};

/// Parse a backend response into a fact map over exactly `requested` fields.
///
/// Requested fields the model left out become `Unknown`; keys that were not
/// requested are dropped. A value that is neither a string nor null fails the
/// whole response rather than producing a partial map.
pub fn parse_fact_response(
    response: &str,
    mode: ResponseMode,
    requested: &[String],
) -> Result<FactMap, ExtractionError> {
    let json_str = match mode {
        ResponseMode::JsonObject => response.trim(),
        ResponseMode::FreeText => extract_json_object(response)?,
    };

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractionError::JsonParsing(e.to_string()))?;

    let object = value.as_object().ok_or_else(|| {
        ExtractionError::MalformedResponse("Top-level JSON value is not an object".into())
    })?;

    let mut facts = FactMap::new();
    for field in requested {
        let raw = object
            .get(field)
            .or_else(|| {
                object
                    .iter()
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case(field))
                    .map(|(_, v)| v)
            });

        let outcome = match raw {
            None | Some(Value::Null) => Outcome::Unknown,
            Some(Value::String(s)) => Outcome::parse(s).unwrap_or(Outcome::Unknown),
            Some(other) => {
                return Err(ExtractionError::MalformedResponse(format!(
                    "Field '{field}' has non-string value {other}"
                )))
            }
        };
        facts.insert(field.clone(), outcome);
    }

    Ok(facts)
}

/// Recover the JSON object embedded in free text: first `{` to last `}`.
pub fn extract_json_object(response: &str) -> Result<&str, ExtractionError> {
    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&response[start..=end]),
        _ => Err(ExtractionError::MalformedResponse(
            "No JSON object found in LLM response".into(),
        )),
    }
}
