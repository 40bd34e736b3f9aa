#![forbid(unsafe_code)]

//! Shared archive-file writer used by both the Knowledge Store's pruning
//! path and the Curator's harmful-bullet archival (§4.5, §9 — "one archive
//! file, one writer contract, reused rather than duplicated").

use crate::error::StoreError;
use lore_core::model::Bullet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveReason {
    Harmful,
    Pruned,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchivedBullet {
    pub bullet: Bullet,
    pub archived_at: String,
    pub reason: ArchiveReason,
}

pub struct Archive {
    path: PathBuf,
}

impl Archive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_all(&self) -> Result<Vec<ArchivedBullet>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut entries = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str(line) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Appends `bullet` with `reason` and a date stamp, verbatim text and
    /// counters preserved. Idempotent: if an entry for this bullet id and
    /// reason already exists, this is a no-op.
    pub fn append(
        &self,
        bullet: &Bullet,
        reason: ArchiveReason,
        archived_at: &str,
    ) -> Result<(), StoreError> {
        let existing = self.read_all()?;
        if existing
            .iter()
            .any(|entry| entry.bullet.id == bullet.id && entry.reason == reason)
        {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entry = ArchivedBullet {
            bullet: bullet.clone(),
            archived_at: archived_at.to_string(),
            reason,
        };
        let line = serde_json::to_string(&entry)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        use std::io::Write;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
