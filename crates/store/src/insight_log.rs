#![forbid(unsafe_code)]

//! Insight log: append-only JSONL store for Reflector output (§3 Insight,
//! §4.5 step 1 "Load insights"), mirroring the Trace Store's tolerant
//! parsing contract.

use crate::error::StoreError;
use lore_core::model::Insight;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct InsightStore {
    path: PathBuf,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InsightReadOutcome {
    pub insights: Vec<Insight>,
    pub skipped_lines: usize,
}

impl InsightStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, insight: &Insight) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(insight)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// A missing insight log yields zero insights, not an error; malformed
    /// lines are skipped with a counter (§4.4 failure semantics).
    pub fn read_all(&self) -> Result<InsightReadOutcome, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(InsightReadOutcome::default())
            }
            Err(err) => return Err(err.into()),
        };
        let mut outcome = InsightReadOutcome::default();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Insight>(line) {
                Ok(insight) => outcome.insights.push(insight),
                Err(_) => outcome.skipped_lines += 1,
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::ids::InsightId;
    use lore_core::model::{InsightSignal, InsightSource};

    fn insight(pattern: &str) -> Insight {
        Insight {
            id: InsightId::new(),
            timestamp: "2026-07-26T00:00:00Z".to_string(),
            task_id: "ITEM-1".to_string(),
            source: InsightSource {
                runner: "tsc".to_string(),
                work_item_ids: vec!["ITEM-1".to_string()],
            },
            signal: InsightSignal {
                pattern: pattern.to_string(),
                evidence: vec!["observed".to_string()],
            },
            recommendation: "fix it".to_string(),
            scope: Vec::new(),
            confidence: 0.9,
            online_eligible: true,
            meta_tags: Vec::new(),
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let store = InsightStore::new("/tmp/lore-insights-missing.jsonl");
        assert_eq!(store.read_all().unwrap(), InsightReadOutcome::default());
    }

    #[test]
    fn append_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = InsightStore::new(dir.path().join("insights.jsonl"));
        let i = insight("type-mismatch");
        store.append(&i).unwrap();
        let outcome = store.read_all().unwrap();
        assert_eq!(outcome.insights, vec![i]);
        assert_eq!(outcome.skipped_lines, 0);
    }

    #[test]
    fn malformed_lines_are_skipped_with_a_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insights.jsonl");
        std::fs::write(&path, "not json\n").unwrap();
        let store = InsightStore::new(&path);
        store.append(&insight("type-mismatch")).unwrap();
        let outcome = store.read_all().unwrap();
        assert_eq!(outcome.insights.len(), 1);
        assert_eq!(outcome.skipped_lines, 1);
    }
}
