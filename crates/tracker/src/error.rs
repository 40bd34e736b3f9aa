#![forbid(unsafe_code)]

use lore_core::CoreError;

#[derive(Debug)]
pub enum TrackerError {
    Core(CoreError),
    /// Non-zero subprocess exit (§7 External tracker failure): the cycle
    /// aborts, the process does not.
    Subprocess { verb: String, stderr: String },
    /// The subprocess call exceeded its deadline and was killed.
    Timeout { verb: String, after_ms: u64 },
    /// The tracker binary's stdout was not the single object or
    /// single-element array the adapter expects.
    UnexpectedOutput { detail: String },
    NotFound { id: String },
}

impl TrackerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(err) => err.code(),
            Self::Subprocess { .. } => "TRACKER_SUBPROCESS_FAILURE",
            Self::Timeout { .. } => "TRACKER_TIMEOUT",
            Self::UnexpectedOutput { .. } => "PARSE_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core(err) => write!(f, "{err}"),
            Self::Subprocess { verb, stderr } => write!(f, "tracker {verb} failed: {stderr}"),
            Self::Timeout { verb, after_ms } => {
                write!(f, "tracker {verb} timed out after {after_ms}ms")
            }
            Self::UnexpectedOutput { detail } => write!(f, "unexpected tracker output: {detail}"),
            Self::NotFound { id } => write!(f, "work item not found: {id}"),
        }
    }
}

impl std::error::Error for TrackerError {}

impl From<CoreError> for TrackerError {
    fn from(value: CoreError) -> Self {
        Self::Core(value)
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(value: std::io::Error) -> Self {
        Self::Core(CoreError::from(value))
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Core(CoreError::from(value))
    }
}
