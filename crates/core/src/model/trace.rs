#![forbid(unsafe_code)]

use crate::ids::TraceId;
use serde::{Deserialize, Serialize};

/// The structured record of one task execution (§3 ExecutionTrace).
///
/// Created on task start, mutated only by its owning session, closed on
/// task completion; then append-written and never modified again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub trace_id: TraceId,
    pub timestamp: String,
    pub bead_id: String,
    pub task_description: String,
    #[serde(default)]
    pub bullet_feedback: Vec<BulletFeedback>,
    #[serde(default)]
    pub results: Vec<ExecutionResult>,
    #[serde(default)]
    pub discovered_issues: Vec<String>,
    pub completed: bool,
    pub outcome: Outcome,
    /// Optional thread reference for the Reflector's thread-context
    /// enrichment (§4.4).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thread_id: Option<String>,
}

impl ExecutionTrace {
    pub fn failed_results(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results
            .iter()
            .filter(|result| result.status == ExecStatus::Fail)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Partial,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulletFeedback {
    pub bullet_id: String,
    pub snapshotted_content: String,
    pub feedback: Feedback,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
    pub applied_at: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Helpful,
    Harmful,
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub runner: String,
    pub command: String,
    pub status: ExecStatus,
    #[serde(default)]
    pub errors: Vec<NormalizedError>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub timestamp: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecStatus {
    Pass,
    Fail,
}

/// §3 NormalizedError.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedError {
    pub tool: Tool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<String>,
    pub message: String,
    pub severity: Severity,
}

/// Polymorphism over runners via a tagged variant, no inheritance (§9).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Tsc,
    Eslint,
    Vitest,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(severity: Severity) -> NormalizedError {
        NormalizedError {
            tool: Tool::Tsc,
            file: Some("src/lib.ts".to_string()),
            line: Some(10),
            column: Some(4),
            code: Some("TS2322".to_string()),
            message: "type mismatch".to_string(),
            severity,
        }
    }

    #[test]
    fn failed_results_filters_by_status() {
        let trace = ExecutionTrace {
            trace_id: TraceId::new(),
            timestamp: "2026-07-26T00:00:00Z".to_string(),
            bead_id: "ITEM-1".to_string(),
            task_description: "fix bug".to_string(),
            bullet_feedback: Vec::new(),
            results: vec![
                ExecutionResult {
                    runner: "tsc".to_string(),
                    command: "tsc --noEmit".to_string(),
                    status: ExecStatus::Fail,
                    errors: vec![error(Severity::Error)],
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: 1,
                    duration_ms: 100,
                    timestamp: "2026-07-26T00:00:01Z".to_string(),
                },
                ExecutionResult {
                    runner: "vitest".to_string(),
                    command: "vitest run".to_string(),
                    status: ExecStatus::Pass,
                    errors: Vec::new(),
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: 0,
                    duration_ms: 200,
                    timestamp: "2026-07-26T00:00:02Z".to_string(),
                },
            ],
            discovered_issues: Vec::new(),
            completed: true,
            outcome: Outcome::Partial,
            thread_id: None,
        };

        assert_eq!(trace.failed_results().count(), 1);
    }
}
