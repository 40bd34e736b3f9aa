#![forbid(unsafe_code)]

//! The Merger (§4.3): the single place deltas turn into playbook bullets.

use std::collections::HashMap;

use lore_core::ids::BulletId;
use lore_core::model::{Bullet, Delta, DeltaOp, DeltaValidationError, Provenance};
use lore_core::normalize::bullet_hash;
use lore_core::sort::canonical_order;
use lore_core::DeltaId;

/// Why a delta did not make it into the merged bullet set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    Duplicate,
    LowEvidence,
    LowConfidence,
    Invalid,
    Harmful,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::LowEvidence => "low-evidence",
            Self::LowConfidence => "low-confidence",
            Self::Invalid => "invalid",
            Self::Harmful => "harmful",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RejectedDelta {
    pub delta_id: DeltaId,
    pub reason: RejectReason,
}

/// Result of a single `merge` call.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    pub bullets: Vec<Bullet>,
    pub accepted_ids: Vec<DeltaId>,
    pub rejected: Vec<RejectedDelta>,
}

/// `merge(existing_bullets, incoming_deltas) -> (bullets, accepted_ids, rejected)`.
///
/// Determinism: the output depends only on `existing` and `incoming`, never
/// on wall-clock time or on any state outside the two arguments, so
/// re-running the merger on the same inputs yields a byte-identical
/// playbook once rendered.
pub fn merge(existing: &[Bullet], incoming: &[Delta], confidence_floor: f64) -> MergeOutcome {
    let mut by_hash: HashMap<String, Bullet> =
        existing.iter().map(|b| (b.hash(), b.clone())).collect();

    let mut accepted_ids = Vec::new();
    let mut rejected = Vec::new();
    // Hash of every bullet touched (added or amended) by a delta this call,
    // so step 3's harmful filter can blame the right delta instead of
    // silently dropping a bullet that only this merge call produced.
    let mut touched_by: HashMap<String, DeltaId> = HashMap::new();

    for delta in incoming {
        if let Err(err) = delta.validate(confidence_floor) {
            let reason = match err {
                DeltaValidationError::LowConfidence => RejectReason::LowConfidence,
                DeltaValidationError::LowEvidence => RejectReason::LowEvidence,
                DeltaValidationError::Invalid(_) => RejectReason::Invalid,
            };
            rejected.push(RejectedDelta {
                delta_id: delta.id,
                reason,
            });
            continue;
        }

        let h = bullet_hash(&delta.section, &delta.content);

        match delta.op {
            DeltaOp::Add => {
                if by_hash.contains_key(&h) {
                    rejected.push(RejectedDelta {
                        delta_id: delta.id,
                        reason: RejectReason::Duplicate,
                    });
                    continue;
                }
                let id = BulletId::try_new(delta.id.to_string()).unwrap_or_else(|_| BulletId::generate());
                let bullet = Bullet {
                    id,
                    section: delta.section.clone(),
                    content: delta.content.clone(),
                    helpful: delta.metadata.helpful,
                    harmful: delta.metadata.harmful,
                    aggregated_from: None,
                    provenance: Some(Provenance {
                        delta_id: delta.id,
                        source_id: delta.metadata.source.clone(),
                        created_at: delta.metadata.created_at.clone(),
                    }),
                };
                by_hash.insert(h.clone(), bullet);
                touched_by.insert(h, delta.id);
                accepted_ids.push(delta.id);
            }
            DeltaOp::Amend => match by_hash.get_mut(&h) {
                None => rejected.push(RejectedDelta {
                    delta_id: delta.id,
                    reason: RejectReason::Invalid,
                }),
                Some(existing_bullet) => {
                    existing_bullet.content = delta.content.clone();
                    existing_bullet.helpful += delta.metadata.helpful;
                    existing_bullet.harmful += delta.metadata.harmful;
                    existing_bullet.provenance = Some(Provenance {
                        delta_id: delta.id,
                        source_id: delta.metadata.source.clone(),
                        created_at: delta.metadata.created_at.clone(),
                    });
                    touched_by.insert(h, delta.id);
                    accepted_ids.push(delta.id);
                }
            },
            DeltaOp::Deprecate => {
                if by_hash.remove(&h).is_none() {
                    rejected.push(RejectedDelta {
                        delta_id: delta.id,
                        reason: RejectReason::Invalid,
                    });
                } else {
                    touched_by.remove(&h);
                    accepted_ids.push(delta.id);
                }
            }
        }
    }

    let mut bullets = Vec::with_capacity(by_hash.len());
    for (h, bullet) in by_hash {
        if bullet.is_live() {
            bullets.push(bullet);
            continue;
        }
        // Only a delta from *this* call can be blamed; a pre-existing
        // harmful bullet untouched this round is dropped silently, same as
        // §4.6's prune.
        if let Some(delta_id) = touched_by.get(&h) {
            accepted_ids.retain(|id| id != delta_id);
            rejected.push(RejectedDelta {
                delta_id: *delta_id,
                reason: RejectReason::Harmful,
            });
        }
    }

    canonical_order(&mut bullets);

    MergeOutcome {
        bullets,
        accepted_ids,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::model::DeltaMetadata;

    fn metadata(confidence: f64, helpful: u32, harmful: u32) -> DeltaMetadata {
        DeltaMetadata {
            source: "ITEM-1".to_string(),
            commit: None,
            files: Vec::new(),
            run: None,
            confidence,
            helpful,
            harmful,
            tags: Vec::new(),
            scope: None,
            evidence: "observed across three failing runs".to_string(),
            created_at: "2026-07-26T00:00:00Z".to_string(),
        }
    }

    fn add_delta(section: &str, content: &str, helpful: u32, harmful: u32) -> Delta {
        Delta {
            id: DeltaId::new(),
            section: section.to_string(),
            op: DeltaOp::Add,
            content: content.to_string(),
            metadata: metadata(0.9, helpful, harmful),
        }
    }

    #[test]
    fn add_inserts_new_bullet() {
        let delta = add_delta("test/patterns", "Always validate input first", 1, 0);
        let outcome = merge(&[], &[delta.clone()], 0.5);
        assert_eq!(outcome.bullets.len(), 1);
        assert_eq!(outcome.accepted_ids, vec![delta.id]);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn add_duplicate_is_rejected() {
        let first = add_delta("test/patterns", "Always validate input first", 1, 0);
        let second = add_delta("test/patterns", "ALWAYS validate input first", 1, 0);
        let outcome = merge(&[], &[first.clone(), second.clone()], 0.5);
        assert_eq!(outcome.bullets.len(), 1);
        assert_eq!(outcome.accepted_ids, vec![first.id]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, RejectReason::Duplicate);
    }

    #[test]
    fn amend_accumulates_counters_and_updates_content() {
        let add = add_delta("test/patterns", "Always validate input first", 2, 1);
        let base = merge(&[], &[add], 0.5).bullets;

        // An amend's hash must match the existing bullet's (S3: "identical
        // hash"), so only casing/whitespace may differ here, never the
        // normalized text itself — a genuine rewrite is a deprecate+add.
        let mut amend = add_delta("test/patterns", "  ALWAYS   VALIDATE   INPUT FIRST  ", 1, 0);
        amend.op = DeltaOp::Amend;

        let outcome = merge(&base, &[amend.clone()], 0.5);
        assert_eq!(outcome.bullets.len(), 1);
        assert_eq!(outcome.bullets[0].helpful, 3);
        assert_eq!(outcome.bullets[0].harmful, 1);
        assert_eq!(
            outcome.bullets[0].content,
            "  ALWAYS   VALIDATE   INPUT FIRST  "
        );
        assert_eq!(outcome.accepted_ids, vec![amend.id]);
    }

    #[test]
    fn amend_on_unknown_hash_is_invalid() {
        let mut amend = add_delta("test/patterns", "Nothing to amend yet here", 1, 0);
        amend.op = DeltaOp::Amend;
        let outcome = merge(&[], &[amend], 0.5);
        assert!(outcome.bullets.is_empty());
        assert_eq!(outcome.rejected[0].reason, RejectReason::Invalid);
    }

    #[test]
    fn deprecate_removes_matching_bullet() {
        let add = add_delta("test/patterns", "Always validate input first", 1, 0);
        let base = merge(&[], &[add], 0.5).bullets;

        let mut deprecate = add_delta("test/patterns", "Always validate input first", 0, 0);
        deprecate.op = DeltaOp::Deprecate;

        let outcome = merge(&base, &[deprecate.clone()], 0.5);
        assert!(outcome.bullets.is_empty());
        assert_eq!(outcome.accepted_ids, vec![deprecate.id]);
    }

    #[test]
    fn deprecate_on_unknown_hash_is_invalid() {
        let mut deprecate = add_delta("test/patterns", "Nothing here to remove at all", 0, 0);
        deprecate.op = DeltaOp::Deprecate;
        let outcome = merge(&[], &[deprecate], 0.5);
        assert_eq!(outcome.rejected[0].reason, RejectReason::Invalid);
    }

    #[test]
    fn low_confidence_delta_is_rejected_before_dispatch() {
        let mut delta = add_delta("test/patterns", "Always validate input first", 1, 0);
        delta.metadata.confidence = 0.1;
        let outcome = merge(&[], &[delta], 0.5);
        assert!(outcome.bullets.is_empty());
        assert_eq!(outcome.rejected[0].reason, RejectReason::LowConfidence);
    }

    #[test]
    fn newly_added_bullet_that_ends_up_harmful_is_rejected_not_kept() {
        let delta = add_delta("test/patterns", "Always validate input first", 1, 2);
        let outcome = merge(&[], &[delta.clone()], 0.5);
        assert!(outcome.bullets.is_empty());
        assert!(outcome.accepted_ids.is_empty());
        assert_eq!(outcome.rejected, vec![RejectedDelta {
            delta_id: delta.id,
            reason: RejectReason::Harmful,
        }]);
    }

    #[test]
    fn pre_existing_harmful_bullet_untouched_this_round_is_dropped_silently() {
        let add = add_delta("test/patterns", "Always validate input first", 1, 2);
        // Build the base bullet set directly rather than through merge, so it
        // starts out already dead without any delta in this call to blame.
        let mut base = merge(&[], &[add], 0.5).bullets;
        if base.is_empty() {
            base.push(Bullet {
                id: BulletId::try_new("preexisting").unwrap(),
                section: "test/patterns".to_string(),
                content: "Always validate input first".to_string(),
                helpful: 1,
                harmful: 2,
                aggregated_from: None,
                provenance: None,
            });
        }
        let unrelated = add_delta("other/patterns", "A totally unrelated bullet here", 1, 0);
        let outcome = merge(&base, &[unrelated], 0.5);
        assert_eq!(outcome.bullets.len(), 1);
        assert_eq!(outcome.bullets[0].section, "other/patterns");
    }

    #[test]
    fn sorts_into_canonical_order() {
        let a = add_delta("b/patterns", "Second bullet content here", 1, 0);
        let b = add_delta("a/patterns", "First bullet content here", 1, 0);
        let outcome = merge(&[], &[a, b], 0.5);
        let sections: Vec<_> = outcome.bullets.iter().map(|bul| bul.section.as_str()).collect();
        assert_eq!(sections, vec!["a/patterns", "b/patterns"]);
    }

    #[test]
    fn merge_is_deterministic_across_repeated_runs() {
        let deltas = vec![
            add_delta("test/patterns", "Always validate input first", 1, 0),
            add_delta("test/patterns", "Keep functions small and focused", 1, 0),
        ];
        let first = merge(&[], &deltas, 0.5);
        let second = merge(&[], &deltas, 0.5);
        assert_eq!(first.bullets, second.bullets);
    }
}
