#![forbid(unsafe_code)]

use crate::ids::InsightId;
use serde::{Deserialize, Serialize};

/// Reflector output before Curator interpretation (§3 Insight).
/// Append-only: once written, never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: InsightId,
    pub timestamp: String,
    pub task_id: String,
    pub source: InsightSource,
    pub signal: InsightSignal,
    pub recommendation: String,
    #[serde(default)]
    pub scope: Vec<String>,
    pub confidence: f64,
    pub online_eligible: bool,
    #[serde(default)]
    pub meta_tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightSource {
    pub runner: String,
    pub work_item_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsightSignal {
    pub pattern: String,
    pub evidence: Vec<String>,
}
