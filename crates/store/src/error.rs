#![forbid(unsafe_code)]

use lore_core::CoreError;

#[derive(Debug)]
pub enum StoreError {
    Core(CoreError),
    Yaml(serde_yaml::Error),
    /// Whole-file malformed config or queue: fatal (§7 Parse error).
    MalformedFile { path: String, detail: String },
    /// Requested section has no bullets and no header; caller must be told
    /// rather than have the write silently skipped (§4.1 find_insert_position).
    SectionNotFound { section: String },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(err) => err.code(),
            Self::Yaml(_) => "PARSE_ERROR",
            Self::MalformedFile { .. } => "PARSE_ERROR",
            Self::SectionNotFound { .. } => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core(err) => write!(f, "{err}"),
            Self::Yaml(err) => write!(f, "yaml: {err}"),
            Self::MalformedFile { path, detail } => {
                write!(f, "malformed file {path}: {detail}")
            }
            Self::SectionNotFound { section } => write!(f, "section not found: {section}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<CoreError> for StoreError {
    fn from(value: CoreError) -> Self {
        Self::Core(value)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Core(CoreError::from(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Core(CoreError::from(value))
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}
