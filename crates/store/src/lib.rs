#![forbid(unsafe_code)]

pub mod archive;
pub mod error;
pub mod insight_log;
pub mod playbook;
pub mod queue;
pub mod trace_log;

pub use archive::{Archive, ArchiveReason, ArchivedBullet};
pub use error::StoreError;
pub use insight_log::{InsightReadOutcome, InsightStore};
pub use playbook::{KnowledgeStore, PlaybookManifest, SectionWeight};
pub use queue::DeltaQueue;
pub use trace_log::{ReadOutcome, RetentionOutcome, TraceStore};
