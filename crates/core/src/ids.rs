#![forbid(unsafe_code)]

//! Stable identifiers for the four append-only/lifecycle types in §3.
//!
//! `BulletId` is a short stable string minted by the Curator/Merger (it is
//! not a UUID — spec.md calls it a "stable short id"); the other three are
//! UUIDs per spec.md's field definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BulletId(String);

impl BulletId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, BulletIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(BulletIdError::Empty);
        }
        if value.len() > 64 {
            return Err(BulletIdError::TooLong);
        }
        Ok(Self(value))
    }

    /// Mint a fresh id from a UUID, used when a bullet is created without a
    /// caller-supplied id (e.g. Merger's `add` path uses `delta.id` instead).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for BulletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulletIdError {
    Empty,
    TooLong,
}

impl std::fmt::Display for BulletIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "bullet id must not be empty"),
            Self::TooLong => write!(f, "bullet id must be at most 64 characters"),
        }
    }
}

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(value)?))
            }
        }
    };
}

uuid_id!(DeltaId);
uuid_id!(InsightId);
uuid_id!(TraceId);
