#![forbid(unsafe_code)]

pub mod atomic;
pub mod config;
pub mod error;
pub mod ids;
pub mod model;
pub mod normalize;
pub mod sort;
pub mod time;

pub use config::Config;
pub use error::CoreError;
pub use ids::{BulletId, DeltaId, InsightId, TraceId};
pub use model::{
    Bullet, BulletFeedback, Delta, DeltaMetadata, DeltaOp, DeltaValidationError, ExecutionResult,
    ExecutionTrace, ExecStatus, Feedback, Insight, InsightSignal, InsightSource, NormalizedError,
    Outcome, Provenance, Severity, Tool,
};
