#![forbid(unsafe_code)]

use lore_core::CoreError;
use lore_store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    Core(CoreError),
    Store(StoreError),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(err) => err.code(),
            Self::Store(err) => err.code(),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<CoreError> for EngineError {
    fn from(value: CoreError) -> Self {
        Self::Core(value)
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
