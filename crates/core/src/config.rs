#![forbid(unsafe_code)]

//! The single config object (§6 Configuration). This module only defines
//! the shape and defaults; reading it from disk/env/flags with the
//! documented precedence is `lore_cli`'s job (§1 Out of scope:
//! environment/config loading is a boundary collaborator, not core).

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agents_path: String,
    pub logs_dir: String,
    pub insights_path: String,
    pub traces_path: String,
    pub delta_queue_path: String,
    pub max_deltas_per_session: u32,
    pub default_confidence: f64,
    pub learning: LearningConfig,
    pub trace_retention: TraceRetentionConfig,
    pub review_routing: ReviewRoutingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents_path: "AGENTS.md".to_string(),
            logs_dir: "logs".to_string(),
            insights_path: "logs/insights.jsonl".to_string(),
            traces_path: "logs/traces.jsonl".to_string(),
            delta_queue_path: "logs/deltas.json".to_string(),
            max_deltas_per_session: 3,
            default_confidence: 0.8,
            learning: LearningConfig::default(),
            trace_retention: TraceRetentionConfig::default(),
            review_routing: ReviewRoutingConfig::default(),
        }
    }
}

impl Config {
    /// §6: `max_deltas_per_session` (default 3, >= 1); `default_confidence`
    /// (default 0.8, in [0, 1]).
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_deltas_per_session < 1 {
            return Err("max_deltas_per_session must be >= 1");
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err("default_confidence must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.learning.confidence_min) {
            return Err("learning.confidence_min must be within [0, 1]");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub confidence_min: f64,
    pub offline: OfflineConfig,
    /// §4.5 harmful-bullet archival threshold: bullets with `harmful >=`
    /// this are excised from the live playbook ("configurable", default 2).
    pub harmful_archive_threshold: u32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            confidence_min: 0.5,
            offline: OfflineConfig::default(),
            harmful_archive_threshold: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    pub epochs: u32,
    pub review_threshold: f64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            review_threshold: 0.7,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceRetentionConfig {
    pub max_traces_per_bead: usize,
    pub max_age_in_days: i64,
    pub archive_path: String,
}

impl Default for TraceRetentionConfig {
    fn default() -> Self {
        Self {
            max_traces_per_bead: 20,
            max_age_in_days: 30,
            archive_path: "logs/traces.archive.jsonl".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewDestination {
    File,
    CommentOnItem,
    NewItem,
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewRoutingConfig {
    pub created: ReviewDestination,
    pub updated: ReviewDestination,
    pub closed: ReviewDestination,
}

impl Default for ReviewRoutingConfig {
    fn default() -> Self {
        Self {
            created: ReviewDestination::None,
            updated: ReviewDestination::None,
            closed: ReviewDestination::File,
        }
    }
}
