#![forbid(unsafe_code)]

//! Tracker Adapter (§4.8): a minimal surface over an external work-item
//! tracker, plus the classification logic for its append-only event log.

pub mod adapter;
pub mod error;
pub mod memory;
pub mod model;
pub mod subprocess;
pub mod watcher;

pub use adapter::TrackerAdapter;
pub use error::TrackerError;
pub use memory::InMemoryTracker;
pub use model::{ClosureEvent, Dependency, DependencyKind, WorkItem, WorkItemStatus};
pub use subprocess::SubprocessTracker;
pub use watcher::{classify_new_lines, route_review, ClassifiedEvent, EventKind, EventLogLine, ReviewAction, ReviewDestination};
