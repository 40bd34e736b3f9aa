#![forbid(unsafe_code)]

use crate::ids::{BulletId, DeltaId};
use crate::normalize::bullet_hash;
use serde::{Deserialize, Serialize};

/// A unit of durable advice in the playbook (§3 Bullet).
///
/// Invariants enforced elsewhere, not by this type: within a live playbook
/// `hash` is unique (Merger §4.3 step 1), `harmful <= helpful` (Merger step
/// 3), and `id` is stable for the bullet's lifetime (caller discipline —
/// nothing here regenerates an existing id).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: BulletId,
    pub section: String,
    pub content: String,
    pub helpful: u32,
    pub harmful: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub aggregated_from: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub provenance: Option<Provenance>,
}

impl Bullet {
    pub fn hash(&self) -> String {
        bullet_hash(&self.section, &self.content)
    }

    pub fn score(&self) -> i64 {
        i64::from(self.helpful) - i64::from(self.harmful)
    }

    /// A bullet is live only while helpful feedback outweighs harmful
    /// feedback (§3 invariant; §4.3 step 3; §4.6 prune).
    pub fn is_live(&self) -> bool {
        self.harmful <= self.helpful
    }
}

/// One-way provenance link: a bullet points back at the delta and source
/// that produced it, never the reverse (§9 Cyclic references).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub delta_id: DeltaId,
    pub source_id: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullet(helpful: u32, harmful: u32) -> Bullet {
        Bullet {
            id: BulletId::try_new("b1").unwrap(),
            section: "test/patterns".to_string(),
            content: "Always validate input".to_string(),
            helpful,
            harmful,
            aggregated_from: None,
            provenance: None,
        }
    }

    #[test]
    fn is_live_requires_harmful_le_helpful() {
        assert!(bullet(2, 2).is_live());
        assert!(!bullet(2, 3).is_live());
    }

    #[test]
    fn score_is_helpful_minus_harmful() {
        assert_eq!(bullet(5, 2).score(), 3);
    }
}
