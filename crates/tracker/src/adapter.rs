#![forbid(unsafe_code)]

//! `TrackerAdapter` (§4.8): a minimal surface over an external issue
//! tracker. Implementations drive a binary (`SubprocessTracker`) or serve
//! from memory (`InMemoryTracker`).

use crate::error::TrackerError;
use crate::model::{ClosureEvent, Dependency, DependencyKind, WorkItem};

pub trait TrackerAdapter {
    fn create(&mut self, title: &str) -> Result<WorkItem, TrackerError>;
    fn list(&self) -> Result<Vec<WorkItem>, TrackerError>;
    fn get(&self, id: &str) -> Result<WorkItem, TrackerError>;
    fn update(&mut self, id: &str, title: &str) -> Result<WorkItem, TrackerError>;

    /// Closing an item yields the `ClosureEvent` that triggers learning
    /// (§4.8's "on close, the adapter fires a closure event").
    fn close(&mut self, id: &str) -> Result<ClosureEvent, TrackerError>;

    fn add_dependency(&mut self, id: &str, target_id: &str, kind: DependencyKind) -> Result<(), TrackerError>;
    fn list_discovered_from(&self, parent_id: &str) -> Result<Vec<WorkItem>, TrackerError>;
    fn export_snapshot(&self) -> Result<Vec<WorkItem>, TrackerError>;
}

pub(crate) fn dependency(target_id: impl Into<String>, kind: DependencyKind) -> Dependency {
    Dependency {
        target_id: target_id.into(),
        kind,
    }
}
