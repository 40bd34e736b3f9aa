#![forbid(unsafe_code)]

mod bullet;
mod delta;
mod insight;
mod trace;

pub use bullet::{Bullet, Provenance};
pub use delta::{Delta, DeltaMetadata, DeltaOp, DeltaValidationError};
pub use insight::{Insight, InsightSignal, InsightSource};
pub use trace::{
    BulletFeedback, ExecStatus, ExecutionResult, ExecutionTrace, Feedback, NormalizedError,
    Outcome, Severity, Tool,
};
