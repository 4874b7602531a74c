use std::path::Path;

use super::types::GoldCase;
use super::GoldFileError;

/// Parse a JSON array of gold cases. Every problem is reported, none skipped.
pub fn parse_gold_cases(json: &str) -> Result<Vec<GoldCase>, GoldFileError> {
    let cases: Vec<GoldCase> =
        serde_json::from_str(json).map_err(|e| GoldFileError::Malformed(e.to_string()))?;
    if cases.is_empty() {
        return Err(GoldFileError::Empty);
    }
    for (index, case) in cases.iter().enumerate() {
        if case.input.trim().is_empty() {
            return Err(GoldFileError::InvalidCase {
                index,
                reason: format!("case '{}' has empty input", case.name),
            });
        }
        if case.expected.is_empty() {
            return Err(GoldFileError::InvalidCase {
                index,
                reason: format!("case '{}' has no expected facts", case.name),
            });
        }
    }
    Ok(cases)
}

pub fn load_gold_cases(path: &Path) -> Result<Vec<GoldCase>, GoldFileError> {
    if !path.exists() {
        return Err(GoldFileError::NotFound(path.display().to_string()));
    }
    let data = std::fs::read_to_string(path)?;
    let cases = parse_gold_cases(&data)?;
    tracing::info!(path = %path.display(), cases = cases.len(), "Gold cases loaded");
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold.json");
        std::fs::write(
            &path,
            r#"[{"name": "a", "input": "oxidase positive", "expected": {"Oxidase": "Positive"}}]"#,
        )
        .unwrap();
        let cases = load_gold_cases(&path).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "a");
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_gold_cases(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GoldFileError::NotFound(_)));
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(
            parse_gold_cases("[{\"name\": 1}]"),
            Err(GoldFileError::Malformed(_))
        ));
    }

    #[test]
    fn empty_list_is_fatal() {
        assert!(matches!(parse_gold_cases("[]"), Err(GoldFileError::Empty)));
    }

    #[test]
    fn case_without_expectations_is_fatal() {
        let err = parse_gold_cases(r#"[{"name": "a", "input": "x", "expected": {}}]"#).unwrap_err();
        assert!(matches!(err, GoldFileError::InvalidCase { index: 0, .. }));
    }
}
