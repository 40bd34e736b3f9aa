#![forbid(unsafe_code)]

//! Delta Queue: durable FIFO-ish queue stored as pretty-printed JSON (§4.2).

use crate::error::StoreError;
use lore_core::atomic::write_atomic;
use lore_core::ids::DeltaId;
use lore_core::model::Delta;
use std::path::{Path, PathBuf};

pub struct DeltaQueue {
    path: PathBuf,
}

impl DeltaQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Readers tolerate a missing file (empty queue) but reject malformed
    /// JSON (§4.2, §7 Parse error — whole-file malformed queue is fatal).
    pub fn read(&self) -> Result<Vec<Delta>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&raw).map_err(|err| StoreError::MalformedFile {
            path: self.path.display().to_string(),
            detail: err.to_string(),
        })
    }

    /// On every write, the queue is sorted by `(section asc, created_at
    /// asc)` for deterministic diffs (§4.2).
    pub fn write(&self, mut deltas: Vec<Delta>) -> Result<(), StoreError> {
        deltas.sort_by(|a, b| {
            a.section
                .cmp(&b.section)
                .then_with(|| a.metadata.created_at.cmp(&b.metadata.created_at))
        });
        let text = serde_json::to_string_pretty(&deltas)?;
        write_atomic(&self.path, text.as_bytes())?;
        Ok(())
    }

    pub fn enqueue(&self, batch: Vec<Delta>) -> Result<(), StoreError> {
        let mut existing = self.read()?;
        existing.extend(batch);
        self.write(existing)
    }

    pub fn dequeue(&self, ids: &[DeltaId]) -> Result<Vec<Delta>, StoreError> {
        let existing = self.read()?;
        let (removed, remaining): (Vec<_>, Vec<_>) =
            existing.into_iter().partition(|delta| ids.contains(&delta.id));
        self.write(remaining)?;
        Ok(removed)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.write(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::model::{DeltaMetadata, DeltaOp};

    fn delta(section: &str, created_at: &str) -> Delta {
        Delta {
            id: DeltaId::new(),
            section: section.to_string(),
            op: DeltaOp::Add,
            content: "Always validate input before processing".to_string(),
            metadata: DeltaMetadata {
                source: "ITEM-1".to_string(),
                commit: None,
                files: Vec::new(),
                run: None,
                confidence: 0.9,
                helpful: 0,
                harmful: 0,
                tags: Vec::new(),
                scope: None,
                evidence: "observed in three failing runs".to_string(),
                created_at: created_at.to_string(),
            },
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let queue = DeltaQueue::new("/tmp/lore-queue-missing-does-not-exist.json");
        assert_eq!(queue.read().unwrap(), Vec::new());
    }

    #[test]
    fn write_sorts_by_section_then_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let queue = DeltaQueue::new(dir.path().join("queue.json"));
        queue
            .write(vec![
                delta("b/patterns", "2026-01-02T00:00:00Z"),
                delta("a/patterns", "2026-01-03T00:00:00Z"),
                delta("a/patterns", "2026-01-01T00:00:00Z"),
            ])
            .unwrap();
        let read = queue.read().unwrap();
        let order: Vec<_> = read
            .iter()
            .map(|d| (d.section.as_str(), d.metadata.created_at.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a/patterns", "2026-01-01T00:00:00Z"),
                ("a/patterns", "2026-01-03T00:00:00Z"),
                ("b/patterns", "2026-01-02T00:00:00Z"),
            ]
        );
    }

    #[test]
    fn enqueue_then_dequeue_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let queue = DeltaQueue::new(dir.path().join("queue.json"));
        let d1 = delta("a/patterns", "2026-01-01T00:00:00Z");
        let d1_id = d1.id;
        queue.enqueue(vec![d1]).unwrap();
        assert_eq!(queue.read().unwrap().len(), 1);

        let removed = queue.dequeue(&[d1_id]).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(queue.read().unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        std::fs::write(&path, "not json").unwrap();
        let queue = DeltaQueue::new(path);
        assert!(matches!(queue.read(), Err(StoreError::MalformedFile { .. })));
    }
}
