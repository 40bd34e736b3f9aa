#![forbid(unsafe_code)]

//! Trace Store: append-only JSONL log plus retention/archival (§4.7).

use crate::error::StoreError;
use lore_core::atomic::write_atomic;
use lore_core::model::ExecutionTrace;
use lore_core::time::age_in_days;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct TraceStore {
    path: PathBuf,
    archive_path: PathBuf,
}

/// Result of a single `ReadResult`: traces parsed plus a count of lines
/// skipped for being malformed (§4.4, §7 — malformed lines are skipped
/// with a counter, not a fatal error).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    pub traces: Vec<ExecutionTrace>,
    pub skipped_lines: usize,
}

impl TraceStore {
    pub fn new(path: impl Into<PathBuf>, archive_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            archive_path: archive_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// O(1) append; a trace is closed exactly once and then never modified
    /// (§3 lifecycles).
    pub fn append(&self, trace: &ExecutionTrace) -> Result<(), StoreError> {
        append_jsonl(&self.path, trace)
    }

    /// §7: missing trace file yields zero traces, not an error.
    pub fn read_all(&self) -> Result<ReadOutcome, StoreError> {
        read_jsonl(&self.path)
    }

    pub fn read_for_bead(&self, bead_id: &str) -> Result<ReadOutcome, StoreError> {
        let mut outcome = self.read_all()?;
        outcome.traces.retain(|trace| trace.bead_id == bead_id);
        Ok(outcome)
    }

    /// Keep at most `max_traces_per_bead` most-recent traces per work item;
    /// any older exceeding that are archived if also older than
    /// `max_age_in_days`. The retained file is rewritten in chronological
    /// order (§4.7).
    pub fn apply_retention(
        &self,
        max_traces_per_bead: usize,
        max_age_in_days: i64,
    ) -> Result<RetentionOutcome, StoreError> {
        let outcome = self.read_all()?;
        let mut by_bead: HashMap<String, Vec<ExecutionTrace>> = HashMap::new();
        for trace in outcome.traces {
            by_bead.entry(trace.bead_id.clone()).or_default().push(trace);
        }

        let mut retained = Vec::new();
        let mut archived = Vec::new();
        for traces in by_bead.values_mut() {
            traces.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            let overflow = traces.len().saturating_sub(max_traces_per_bead);
            for (index, trace) in traces.drain(..).enumerate() {
                let is_overflow = index < overflow;
                let is_old = age_in_days(&trace.timestamp).is_none_or(|age| age > max_age_in_days);
                if is_overflow && is_old {
                    archived.push(trace);
                } else {
                    retained.push(trace);
                }
            }
        }
        retained.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let text = retained
            .iter()
            .map(|trace| serde_json::to_string(trace))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n");
        let text = if text.is_empty() {
            String::new()
        } else {
            format!("{text}\n")
        };
        write_atomic(&self.path, text.as_bytes())?;

        for trace in &archived {
            append_jsonl(&self.archive_path, trace)?;
        }

        Ok(RetentionOutcome {
            retained: retained.len(),
            archived: archived.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionOutcome {
    pub retained: usize,
    pub archived: usize,
}

fn append_jsonl<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let line = serde_json::to_string(value)?;
    writeln!(file, "{line}")?;
    Ok(())
}

fn read_jsonl(path: &Path) -> Result<ReadOutcome, StoreError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ReadOutcome::default()),
        Err(err) => return Err(err.into()),
    };
    let mut outcome = ReadOutcome::default();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ExecutionTrace>(line) {
            Ok(trace) => outcome.traces.push(trace),
            Err(_) => outcome.skipped_lines += 1,
        }
    }
    Ok(outcome)
}
