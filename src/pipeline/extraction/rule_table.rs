//! Versioned rule table: the deterministic extractor's learned rules.
//!
//! Plain text so operators can read and hand-edit it:
//! ```text
//! # comments
//! version: 4
//! # >>> learned rules
//! Nitrate Reduction => nitrate\ reduction\W*(positive|negative|detected|produced)
//! ```
//! Every rule pattern must capture its outcome indicator in group 1. New
//! learned rules are inserted directly below the marker line.

use std::io::Write;
use std::path::{Path, PathBuf};

use regex::Regex;
use sha2::{Digest, Sha256};

use super::RuleTableError;
use crate::models::Outcome;

/// Designated insertion point for synthesized rules.
pub const LEARNED_MARKER: &str = "# >>> learned rules";

const VERSION_PREFIX: &str = "version:";
const RULE_SEPARATOR: &str = " => ";

const SEED_TABLE: &str = "\
# Phenoparse rule table
# One rule per line: <Field Name> => <pattern>
# Patterns run against normalized (lower-case, single-spaced) text and must
# capture the outcome indicator in group 1.
version: 1
# >>> learned rules
";

/// One pattern rule bound to a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRule {
    pub field: String,
    pub pattern: String,
}

/// Parsed, validated rule table. `text` is the authoritative content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    text: String,
    version: u32,
    rules: Vec<TableRule>,
}

/// Render a rule exactly as it is stored in the table.
pub fn format_rule_line(field: &str, pattern: &str) -> String {
    format!("{field}{RULE_SEPARATOR}{pattern}")
}

/// Map a captured indicator token to an outcome.
pub fn outcome_for_indicator(indicator: &str) -> Option<Outcome> {
    match indicator.trim() {
        "positive" | "detected" | "produced" | "+" => Some(Outcome::Positive),
        "negative" | "absent" | "not detected" | "-" => Some(Outcome::Negative),
        "variable" => Some(Outcome::Variable),
        _ => None,
    }
}

impl RuleTable {
    /// Initial table: no learned rules yet.
    pub fn seed() -> Self {
        // The seed text is a constant that always parses.
        match Self::parse(SEED_TABLE) {
            Ok(table) => table,
            Err(_) => Self {
                text: SEED_TABLE.to_string(),
                version: 1,
                rules: Vec::new(),
            },
        }
    }

    pub fn parse(text: &str) -> Result<Self, RuleTableError> {
        let mut version: Option<u32> = None;
        let mut markers = 0usize;
        let mut rules = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line == LEARNED_MARKER {
                markers += 1;
                continue;
            }
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix(VERSION_PREFIX) {
                let parsed = rest
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| RuleTableError::InvalidVersion(rest.trim().to_string()))?;
                version = Some(parsed);
                continue;
            }

            let (field, pattern) = line
                .split_once(RULE_SEPARATOR)
                .map(|(f, p)| (f.trim(), p.trim()))
                .filter(|(f, p)| !f.is_empty() && !p.is_empty())
                .ok_or_else(|| RuleTableError::MalformedLine {
                    line: idx + 1,
                    content: line.to_string(),
                })?;

            validate_pattern(field, pattern)?;
            rules.push(TableRule {
                field: field.to_string(),
                pattern: pattern.to_string(),
            });
        }

        if markers != 1 {
            return Err(RuleTableError::MarkerCount(markers));
        }
        let version = version.ok_or(RuleTableError::MissingVersion)?;

        Ok(Self {
            text: text.to_string(),
            version,
            rules,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &[TableRule] {
        &self.rules
    }

    /// Textual containment check against the whole table.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// SHA-256 of the table text, hex encoded.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.text.as_bytes()))
    }

    /// New table version with `lines` inserted below the learned-rules
    /// marker. Everything else is carried over; the version line is bumped.
    /// An empty `lines` returns an identical copy.
    pub fn with_learned_lines(&self, lines: &[String]) -> Result<Self, RuleTableError> {
        if lines.is_empty() {
            return Ok(self.clone());
        }

        let next_version = self.version + 1;
        let mut out = String::with_capacity(self.text.len() + lines.iter().map(|l| l.len() + 1).sum::<usize>());
        for raw in self.text.lines() {
            let trimmed = raw.trim();
            if trimmed.starts_with(VERSION_PREFIX) {
                out.push_str(&format!("{VERSION_PREFIX} {next_version}"));
                out.push('\n');
                continue;
            }
            out.push_str(raw);
            out.push('\n');
            if trimmed == LEARNED_MARKER {
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        if !self.text.ends_with('\n') {
            out.pop();
        }

        Self::parse(&out)
    }
}

fn validate_pattern(field: &str, pattern: &str) -> Result<(), RuleTableError> {
    let regex = Regex::new(pattern).map_err(|e| RuleTableError::InvalidPattern {
        field: field.to_string(),
        reason: e.to_string(),
    })?;
    if regex.captures_len() < 2 {
        return Err(RuleTableError::InvalidPattern {
            field: field.to_string(),
            reason: "pattern has no capture group for the outcome indicator".into(),
        });
    }
    Ok(())
}

/// File-backed rule table.
///
/// Saves are validated and atomic (temp file in the same directory, then
/// rename), so a failed write leaves the previous table in place.
pub struct RuleTableStore {
    path: PathBuf,
}

impl RuleTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the latest table, or the seed table when none was saved yet.
    pub fn load(&self) -> Result<RuleTable, RuleTableError> {
        if !self.path.exists() {
            return Ok(RuleTable::seed());
        }
        let text = std::fs::read_to_string(&self.path)?;
        RuleTable::parse(&text)
    }

    pub fn save(&self, table: &RuleTable) -> Result<(), RuleTableError> {
        // Re-validate from text: never persist something `load` would reject.
        RuleTable::parse(table.text())?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(table.text().as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| RuleTableError::Io(e.error))?;

        tracing::info!(
            path = %self.path.display(),
            version = table.version(),
            digest = %table.digest(),
            "Rule table saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULE: &str = r"nitrate\ reduction\W*(positive|negative|detected|produced)";

    #[test]
    fn seed_table_parses() {
        let table = RuleTable::seed();
        assert_eq!(table.version(), 1);
        assert!(table.rules().is_empty());
        assert!(table.contains_text(LEARNED_MARKER));
    }

    #[test]
    fn parse_reads_rules_anywhere() {
        let text = format!(
            "version: 3\nUrease => urease (positive|negative)\n{LEARNED_MARKER}\n{}\n",
            format_rule_line("Nitrate Reduction", RULE)
        );
        let table = RuleTable::parse(&text).unwrap();
        assert_eq!(table.version(), 3);
        assert_eq!(table.rules().len(), 2);
        assert_eq!(table.rules()[1].field, "Nitrate Reduction");
        assert_eq!(table.rules()[1].pattern, RULE);
    }

    #[test]
    fn parse_requires_version() {
        let err = RuleTable::parse(&format!("{LEARNED_MARKER}\n")).unwrap_err();
        assert!(matches!(err, RuleTableError::MissingVersion));
    }

    #[test]
    fn parse_requires_single_marker() {
        let err = RuleTable::parse("version: 1\n").unwrap_err();
        assert!(matches!(err, RuleTableError::MarkerCount(0)));
        let err = RuleTable::parse(&format!("version: 1\n{LEARNED_MARKER}\n{LEARNED_MARKER}\n"))
            .unwrap_err();
        assert!(matches!(err, RuleTableError::MarkerCount(2)));
    }

    #[test]
    fn parse_rejects_bad_regex() {
        let text = format!("version: 1\n{LEARNED_MARKER}\nOxidase => oxidase (positive\n");
        assert!(matches!(
            RuleTable::parse(&text),
            Err(RuleTableError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn parse_rejects_pattern_without_capture() {
        let text = format!("version: 1\n{LEARNED_MARKER}\nOxidase => oxidase positive\n");
        assert!(matches!(
            RuleTable::parse(&text),
            Err(RuleTableError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn parse_rejects_line_without_separator() {
        let text = format!("version: 1\n{LEARNED_MARKER}\njust some words\n");
        assert!(matches!(
            RuleTable::parse(&text),
            Err(RuleTableError::MalformedLine { line: 3, .. })
        ));
    }

    #[test]
    fn inserting_lines_bumps_version_and_keeps_content() {
        let seed = RuleTable::seed();
        let line = format_rule_line("Nitrate Reduction", RULE);
        let next = seed.with_learned_lines(std::slice::from_ref(&line)).unwrap();
        assert_eq!(next.version(), 2);
        assert_eq!(next.rules().len(), 1);
        assert!(next.text().contains(&format!("{LEARNED_MARKER}\n{line}\n")));
        assert!(next.text().starts_with("# Phenoparse rule table\n"));
        assert_ne!(seed.digest(), next.digest());
    }

    #[test]
    fn inserting_nothing_is_identity() {
        let seed = RuleTable::seed();
        let same = seed.with_learned_lines(&[]).unwrap();
        assert_eq!(same.text(), seed.text());
        assert_eq!(same.version(), seed.version());
    }

    #[test]
    fn indicator_mapping() {
        assert_eq!(outcome_for_indicator("produced"), Some(Outcome::Positive));
        assert_eq!(outcome_for_indicator("detected"), Some(Outcome::Positive));
        assert_eq!(outcome_for_indicator("negative"), Some(Outcome::Negative));
        assert_eq!(outcome_for_indicator("maybe"), None);
    }

    #[test]
    fn store_load_missing_returns_seed() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleTableStore::new(dir.path().join("rules.tbl"));
        assert_eq!(store.load().unwrap(), RuleTable::seed());
    }

    #[test]
    fn store_round_trips_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleTableStore::new(dir.path().join("nested").join("rules.tbl"));
        let table = RuleTable::seed()
            .with_learned_lines(&[format_rule_line("Nitrate Reduction", RULE)])
            .unwrap();
        store.save(&table).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn failed_save_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.tbl");
        let store = RuleTableStore::new(&path);
        store.save(&RuleTable::seed()).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        // A table that bypassed validation must not reach disk.
        let broken = RuleTable {
            text: "version: x\n".into(),
            version: 9,
            rules: vec![],
        };
        assert!(store.save(&broken).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn unreadable_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.tbl");
        std::fs::write(&path, "garbage without marker").unwrap();
        assert!(RuleTableStore::new(&path).load().is_err());
    }
}
