#![forbid(unsafe_code)]

//! Classification half of the tracker event-log watcher (§4.8). The
//! actual filesystem watch (inotify/kqueue) is out of scope; this module
//! exposes the pure function an out-of-scope polling loop would call on
//! every batch of newly appended lines, plus the review-routing dispatch.

use serde::{Deserialize, Serialize};

pub use lore_core::config::ReviewDestination;

use crate::model::WorkItemStatus;

/// One line of the tracker's append-only event log, as read back for
/// classification. Mirrors the subset of `WorkItem` the watcher needs.
#[derive(Clone, Debug, Deserialize)]
pub struct EventLogLine {
    pub item_id: String,
    pub status: WorkItemStatus,
    pub timestamp: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub item_id: String,
    pub kind: EventKind,
    pub timestamp: String,
}

/// What the (out-of-scope) adapter should do in response to a classified
/// event, given its configured destination. `File` is the only variant
/// this crate executes directly; the others are handed back for the
/// adapter to carry out against the live tracker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewAction {
    AppendToFile { line: String },
    CommentOnItem { item_id: String, comment: String },
    CreateNewItem { title: String },
    None,
}

/// Classifies the lines appended since the last read (`all_lines[prev_len..]`)
/// against the lines already seen (`all_lines[..prev_len]`), using status
/// and timing heuristics: an item id seen for the first time is `created`;
/// an item id seen before whose status changed to `closed` is `closed`;
/// any other repeat appearance is `updated`.
pub fn classify_new_lines(prev_len: usize, all_lines: &[EventLogLine]) -> Vec<ClassifiedEvent> {
    let seen_before = &all_lines[..prev_len.min(all_lines.len())];
    let new_lines = &all_lines[prev_len.min(all_lines.len())..];

    let mut events = Vec::with_capacity(new_lines.len());
    for line in new_lines {
        let prior_status = seen_before
            .iter()
            .rev()
            .find(|prior| prior.item_id == line.item_id)
            .map(|prior| prior.status);

        let kind = match (prior_status, line.status) {
            (None, _) => EventKind::Created,
            (Some(_), WorkItemStatus::Closed) => EventKind::Closed,
            (Some(prior), status) if prior == status => EventKind::Updated,
            (Some(_), _) => EventKind::Updated,
        };

        events.push(ClassifiedEvent {
            item_id: line.item_id.clone(),
            kind,
            timestamp: line.timestamp.clone(),
        });
    }
    events
}

/// Resolves a classified event to the action its configured destination
/// implies. `None` destination always yields `ReviewAction::None`
/// regardless of event kind.
pub fn route_review(event: &ClassifiedEvent, destination: ReviewDestination) -> ReviewAction {
    match destination {
        ReviewDestination::None => ReviewAction::None,
        ReviewDestination::File => ReviewAction::AppendToFile {
            line: format!("{} {:?} at {}", event.item_id, event.kind, event.timestamp),
        },
        ReviewDestination::CommentOnItem => ReviewAction::CommentOnItem {
            item_id: event.item_id.clone(),
            comment: format!("{:?} at {}", event.kind, event.timestamp),
        },
        ReviewDestination::NewItem => ReviewAction::CreateNewItem {
            title: format!("review: {} ({:?})", event.item_id, event.kind),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: &str, status: WorkItemStatus, timestamp: &str) -> EventLogLine {
        EventLogLine {
            item_id: item_id.to_string(),
            status,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn first_appearance_of_an_item_is_created() {
        let all = vec![line("ITEM-1", WorkItemStatus::Open, "t0")];
        let events = classify_new_lines(0, &all);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Created);
    }

    #[test]
    fn transition_to_closed_is_classified_closed() {
        let all = vec![
            line("ITEM-1", WorkItemStatus::Open, "t0"),
            line("ITEM-1", WorkItemStatus::InProgress, "t1"),
            line("ITEM-1", WorkItemStatus::Closed, "t2"),
        ];
        let events = classify_new_lines(2, &all);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Closed);
    }

    #[test]
    fn repeat_appearance_without_status_change_is_updated() {
        let all = vec![
            line("ITEM-1", WorkItemStatus::InProgress, "t0"),
            line("ITEM-1", WorkItemStatus::InProgress, "t1"),
        ];
        let events = classify_new_lines(1, &all);
        assert_eq!(events[0].kind, EventKind::Updated);
    }

    #[test]
    fn batch_with_no_prior_lines_classifies_every_line_as_created() {
        let all = vec![
            line("ITEM-1", WorkItemStatus::Open, "t0"),
            line("ITEM-2", WorkItemStatus::Open, "t0"),
        ];
        let events = classify_new_lines(0, &all);
        assert!(events.iter().all(|event| event.kind == EventKind::Created));
    }

    #[test]
    fn none_destination_always_yields_none_action() {
        let event = ClassifiedEvent {
            item_id: "ITEM-1".to_string(),
            kind: EventKind::Closed,
            timestamp: "t2".to_string(),
        };
        assert_eq!(route_review(&event, ReviewDestination::None), ReviewAction::None);
    }

    #[test]
    fn file_destination_appends_a_formatted_line() {
        let event = ClassifiedEvent {
            item_id: "ITEM-1".to_string(),
            kind: EventKind::Created,
            timestamp: "t0".to_string(),
        };
        match route_review(&event, ReviewDestination::File) {
            ReviewAction::AppendToFile { line } => assert!(line.contains("ITEM-1")),
            other => panic!("expected AppendToFile, got {other:?}"),
        }
    }

    #[test]
    fn new_item_destination_yields_a_titled_create_action() {
        let event = ClassifiedEvent {
            item_id: "ITEM-9".to_string(),
            kind: EventKind::Closed,
            timestamp: "t3".to_string(),
        };
        match route_review(&event, ReviewDestination::NewItem) {
            ReviewAction::CreateNewItem { title } => assert!(title.contains("ITEM-9")),
            other => panic!("expected CreateNewItem, got {other:?}"),
        }
    }
}
