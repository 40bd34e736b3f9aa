#![forbid(unsafe_code)]

//! Work-item shape as observed (not owned) by the adapter (§4.8).

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    pub status: WorkItemStatus,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub discovered_from: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Open,
    InProgress,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Blocks,
    Related,
    ParentChild,
    DiscoveredFrom,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub target_id: String,
    pub kind: DependencyKind,
}

/// Fired when an item transitions to `closed` (§4.8): the pipeline
/// responds by running the learning cycle filtered to this item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureEvent {
    pub item_id: String,
    pub closed_at: String,
}
