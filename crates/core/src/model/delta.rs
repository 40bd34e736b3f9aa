#![forbid(unsafe_code)]

use crate::ids::DeltaId;
use serde::{Deserialize, Serialize};

/// A proposed atomic change to the bullet set (§3 Delta).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub id: DeltaId,
    pub section: String,
    pub op: DeltaOp,
    pub content: String,
    pub metadata: DeltaMetadata,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaOp {
    Add,
    Amend,
    Deprecate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeltaMetadata {
    /// External work-item id this delta was grounded on.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub run: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub helpful: u32,
    #[serde(default)]
    pub harmful: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scope: Option<Vec<String>>,
    pub evidence: String,
    pub created_at: String,
}

impl Delta {
    /// §3: "A delta is *valid* iff schema holds, confidence >=
    /// confidence_floor, and evidence length >= 8."
    pub fn validate(&self, confidence_floor: f64) -> Result<(), DeltaValidationError> {
        if self.section.trim().is_empty() {
            return Err(DeltaValidationError::Invalid("section must not be empty"));
        }
        if self.content.trim().len() < 8 {
            return Err(DeltaValidationError::Invalid(
                "content must be at least 8 characters",
            ));
        }
        if !(0.0..=1.0).contains(&self.metadata.confidence) {
            return Err(DeltaValidationError::Invalid(
                "confidence must be within [0, 1]",
            ));
        }
        if self.metadata.confidence < confidence_floor {
            return Err(DeltaValidationError::LowConfidence);
        }
        if self.metadata.evidence.trim().len() < 8 {
            return Err(DeltaValidationError::LowEvidence);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaValidationError {
    Invalid(&'static str),
    LowConfidence,
    LowEvidence,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_metadata() -> DeltaMetadata {
        DeltaMetadata {
            source: "ITEM-1".to_string(),
            commit: None,
            files: Vec::new(),
            run: None,
            confidence: 0.9,
            helpful: 1,
            harmful: 0,
            tags: Vec::new(),
            scope: None,
            evidence: "observed in three failing runs".to_string(),
            created_at: "2026-07-26T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn validate_rejects_short_evidence() {
        let mut metadata = base_metadata();
        metadata.evidence = "short".to_string();
        let delta = Delta {
            id: DeltaId::new(),
            section: "test/patterns".to_string(),
            op: DeltaOp::Add,
            content: "Always validate input before processing".to_string(),
            metadata,
        };
        assert_eq!(
            delta.validate(0.5),
            Err(DeltaValidationError::LowEvidence)
        );
    }

    #[test]
    fn validate_rejects_below_confidence_floor() {
        let mut metadata = base_metadata();
        metadata.confidence = 0.2;
        let delta = Delta {
            id: DeltaId::new(),
            section: "test/patterns".to_string(),
            op: DeltaOp::Add,
            content: "Always validate input before processing".to_string(),
            metadata,
        };
        assert_eq!(
            delta.validate(0.5),
            Err(DeltaValidationError::LowConfidence)
        );
    }

    #[test]
    fn validate_accepts_well_formed_delta() {
        let delta = Delta {
            id: DeltaId::new(),
            section: "test/patterns".to_string(),
            op: DeltaOp::Add,
            content: "Always validate input before processing".to_string(),
            metadata: base_metadata(),
        };
        assert_eq!(delta.validate(0.5), Ok(()));
    }
}
