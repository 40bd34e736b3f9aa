#![forbid(unsafe_code)]

/// Low-level failure shared across every crate in the workspace.
///
/// Domain crates (`lore_store`, `lore_engine`, `lore_tracker`) wrap this in
/// their own error enum via `From<CoreError>` rather than re-deriving the
/// same io/parse variants.
#[derive(Debug)]
pub enum CoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A value failed schema or range validation; the `&'static str` names
    /// the field or rule, never carries interpolated user data.
    InvalidInput(&'static str),
    /// A write target resolved outside the configured knowledge root.
    ScopeViolation { attempted: String, root: String },
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Json(_) => "PARSE_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ScopeViolation { .. } => "WRITE_SCOPE_VIOLATION",
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Json(err) => write!(f, "json: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::ScopeViolation { attempted, root } => write!(
                f,
                "write scope violation (attempted={attempted}, root={root})"
            ),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<std::io::Error> for CoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
