#![forbid(unsafe_code)]

//! In-memory stub tracker (§4.8): used in tests and as a fallback when no
//! tracker binary is configured.

use std::collections::HashMap;

use crate::adapter::{dependency, TrackerAdapter};
use crate::error::TrackerError;
use crate::model::{ClosureEvent, DependencyKind, WorkItem, WorkItemStatus};

#[derive(Default)]
pub struct InMemoryTracker {
    items: HashMap<String, WorkItem>,
    next_id: u64,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        format!("ITEM-{}", self.next_id)
    }
}

impl TrackerAdapter for InMemoryTracker {
    fn create(&mut self, title: &str) -> Result<WorkItem, TrackerError> {
        let id = self.mint_id();
        let item = WorkItem {
            id: id.clone(),
            title: title.to_string(),
            status: WorkItemStatus::Open,
            dependencies: Vec::new(),
            discovered_from: None,
        };
        self.items.insert(id, item.clone());
        Ok(item)
    }

    fn list(&self) -> Result<Vec<WorkItem>, TrackerError> {
        let mut items: Vec<_> = self.items.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    fn get(&self, id: &str) -> Result<WorkItem, TrackerError> {
        self.items
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound { id: id.to_string() })
    }

    fn update(&mut self, id: &str, title: &str) -> Result<WorkItem, TrackerError> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound { id: id.to_string() })?;
        item.title = title.to_string();
        if item.status == WorkItemStatus::Open {
            item.status = WorkItemStatus::InProgress;
        }
        Ok(item.clone())
    }

    fn close(&mut self, id: &str) -> Result<ClosureEvent, TrackerError> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound { id: id.to_string() })?;
        item.status = WorkItemStatus::Closed;
        Ok(ClosureEvent {
            item_id: id.to_string(),
            closed_at: lore_core::time::now_rfc3339(),
        })
    }

    fn add_dependency(&mut self, id: &str, target_id: &str, kind: DependencyKind) -> Result<(), TrackerError> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound { id: id.to_string() })?;
        item.dependencies.push(dependency(target_id, kind));
        Ok(())
    }

    fn list_discovered_from(&self, parent_id: &str) -> Result<Vec<WorkItem>, TrackerError> {
        let mut items: Vec<_> = self
            .items
            .values()
            .filter(|item| item.discovered_from.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    fn export_snapshot(&self) -> Result<Vec<WorkItem>, TrackerError> {
        self.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_close_fires_a_closure_event() {
        let mut tracker = InMemoryTracker::new();
        let item = tracker.create("fix the thing").unwrap();
        let event = tracker.close(&item.id).unwrap();
        assert_eq!(event.item_id, item.id);
        assert_eq!(tracker.get(&item.id).unwrap().status, WorkItemStatus::Closed);
    }

    #[test]
    fn update_moves_open_item_to_in_progress() {
        let mut tracker = InMemoryTracker::new();
        let item = tracker.create("fix the thing").unwrap();
        let updated = tracker.update(&item.id, "fix the thing properly").unwrap();
        assert_eq!(updated.status, WorkItemStatus::InProgress);
    }

    #[test]
    fn get_on_unknown_id_is_not_found() {
        let tracker = InMemoryTracker::new();
        assert!(matches!(tracker.get("nope"), Err(TrackerError::NotFound { .. })));
    }

    #[test]
    fn list_discovered_from_filters_by_parent() {
        let mut tracker = InMemoryTracker::new();
        let parent = tracker.create("parent task").unwrap();
        let child_id = tracker.mint_id();
        tracker.items.insert(
            child_id.clone(),
            WorkItem {
                id: child_id.clone(),
                title: "discovered child".to_string(),
                status: WorkItemStatus::Open,
                dependencies: Vec::new(),
                discovered_from: Some(parent.id.clone()),
            },
        );
        let children = tracker.list_discovered_from(&parent.id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child_id);
    }
}
