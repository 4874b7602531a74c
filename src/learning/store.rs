use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::{FeedbackRecord, HeuristicCandidate};
use super::StoreError;

/// Section of the heuristics document owned by the learner.
pub const AUTO_HEURISTICS_SECTION: &str = "auto_heuristics";

/// Cumulative feedback log. Append-only until an operator clears it.
pub trait FeedbackRepository {
    fn load_all(&self) -> Result<Vec<FeedbackRecord>, StoreError>;
    fn append(&mut self, records: &[FeedbackRecord]) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Learned-heuristics memory. `replace` swaps the whole candidate set.
pub trait HeuristicRepository {
    fn load(&self) -> Result<Vec<HeuristicCandidate>, StoreError>;
    fn replace(&mut self, candidates: &[HeuristicCandidate]) -> Result<(), StoreError>;
}

/// Write `bytes` to `path` through a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

// ── JSON files ───────────────────────────────────────────────

/// Feedback log stored as a JSON array.
pub struct JsonFeedbackStore {
    path: PathBuf,
}

impl JsonFeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, records: &[FeedbackRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records)?;
        write_atomic(&self.path, &json)
    }
}

impl FeedbackRepository for JsonFeedbackStore {
    fn load_all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn append(&mut self, records: &[FeedbackRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut all = self.load_all()?;
        all.extend_from_slice(records);
        self.save(&all)?;
        tracing::info!(
            path = %self.path.display(),
            appended = records.len(),
            total = all.len(),
            "Feedback appended"
        );
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.save(&[])?;
        tracing::info!(path = %self.path.display(), "Feedback log cleared");
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HeuristicEntry {
    rule: String,
    count: usize,
}

/// Heuristics memory stored as a JSON object. Only the
/// `auto_heuristics` section is rewritten; other sections are preserved.
pub struct JsonHeuristicStore {
    path: PathBuf,
}

impl JsonHeuristicStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        if !self.path.exists() {
            return Ok(serde_json::Map::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        let value: serde_json::Value = serde_json::from_str(&data)?;
        match value {
            serde_json::Value::Object(doc) => Ok(doc),
            _ => Err(StoreError::InvalidDocument(self.path.display().to_string())),
        }
    }
}

impl HeuristicRepository for JsonHeuristicStore {
    fn load(&self) -> Result<Vec<HeuristicCandidate>, StoreError> {
        let mut doc = self.load_document()?;
        let Some(section) = doc.remove(AUTO_HEURISTICS_SECTION) else {
            return Ok(Vec::new());
        };
        let entries: BTreeMap<String, HeuristicEntry> = serde_json::from_value(section)?;
        Ok(entries
            .into_iter()
            .map(|(field, entry)| HeuristicCandidate {
                field,
                rule: entry.rule,
                count: entry.count,
            })
            .collect())
    }

    fn replace(&mut self, candidates: &[HeuristicCandidate]) -> Result<(), StoreError> {
        let mut doc = self.load_document()?;
        let section: BTreeMap<&str, HeuristicEntry> = candidates
            .iter()
            .map(|c| {
                (
                    c.field.as_str(),
                    HeuristicEntry {
                        rule: c.rule.clone(),
                        count: c.count,
                    },
                )
            })
            .collect();
        doc.insert(AUTO_HEURISTICS_SECTION.to_string(), serde_json::to_value(section)?);
        let json = serde_json::to_vec_pretty(&serde_json::Value::Object(doc))?;
        write_atomic(&self.path, &json)?;
        tracing::info!(
            path = %self.path.display(),
            candidates = candidates.len(),
            "Heuristics saved"
        );
        Ok(())
    }
}

// ── In-memory ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    records: Vec<FeedbackRecord>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackRepository for InMemoryFeedbackStore {
    fn load_all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn append(&mut self, records: &[FeedbackRecord]) -> Result<(), StoreError> {
        self.records.extend_from_slice(records);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.records.clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHeuristicStore {
    candidates: Vec<HeuristicCandidate>,
}

impl InMemoryHeuristicStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeuristicRepository for InMemoryHeuristicStore {
    fn load(&self) -> Result<Vec<HeuristicCandidate>, StoreError> {
        Ok(self.candidates.clone())
    }

    fn replace(&mut self, candidates: &[HeuristicCandidate]) -> Result<(), StoreError> {
        self.candidates = candidates.to_vec();
        Ok(())
    }
}
