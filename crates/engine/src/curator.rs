#![forbid(unsafe_code)]

//! The Curator (§4.5): turns eligible insights into deltas, consolidates
//! the playbook after every write, ingests closed-trace bullet feedback,
//! and archives bullets that have gone harmful.

use std::collections::HashMap;

use lore_core::ids::BulletId;
use lore_core::model::{Bullet, Delta, DeltaMetadata, DeltaOp, ExecutionTrace, Feedback, Insight};
use lore_core::normalize::normalize;
use lore_core::DeltaId;
use lore_store::{Archive, ArchiveReason, StoreError};

/// §4.5 step 1: `online_eligible ∧ confidence ≥ threshold`.
pub fn eligible_insights(insights: &[Insight], confidence_threshold: f64) -> Vec<Insight> {
    insights
        .iter()
        .filter(|insight| insight.online_eligible && insight.confidence >= confidence_threshold)
        .cloned()
        .collect()
}

/// §4.5 step 2: dedupe by `normalize(signal.pattern)`, keeping the first.
pub fn dedupe_by_pattern(insights: Vec<Insight>) -> Vec<Insight> {
    let mut seen = std::collections::HashSet::new();
    insights
        .into_iter()
        .filter(|insight| seen.insert(normalize(&insight.signal.pattern)))
        .collect()
}

/// §4.5 step 3: route an insight to a playbook section by matching its meta
/// tags and source runner against the configured table.
pub fn route_section(insight: &Insight) -> &'static str {
    let tags_and_runner: Vec<String> = insight
        .meta_tags
        .iter()
        .cloned()
        .chain(std::iter::once(insight.source.runner.clone()))
        .map(|s| s.to_lowercase())
        .collect();

    let has = |needle: &str| tags_and_runner.iter().any(|tag| tag.contains(needle));

    if has("tsc") || has("type") {
        "typescript/patterns"
    } else if has("vitest") || has("test") {
        "build/test/patterns"
    } else if has("discovery") || has("meta-pattern") {
        "architecture/patterns"
    } else if has("discovered-from") || has("dependency") {
        "dependency/patterns"
    } else {
        "build/test/patterns"
    }
}

/// §4.5 steps 3-4: route, convert to deltas, sort by confidence descending,
/// truncate to `max_deltas_per_session`.
pub fn insights_to_deltas(insights: &[Insight], max_deltas_per_session: u32, created_at: &str) -> Vec<Delta> {
    let mut ordered = insights.to_vec();
    ordered.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));

    ordered
        .into_iter()
        .take(max_deltas_per_session as usize)
        .map(|insight| Delta {
            id: DeltaId::new(),
            section: route_section(&insight).to_string(),
            op: DeltaOp::Add,
            content: insight.recommendation.clone(),
            metadata: DeltaMetadata {
                source: insight.task_id.clone(),
                commit: None,
                files: insight.scope.clone(),
                run: None,
                confidence: insight.confidence,
                helpful: 0,
                harmful: 0,
                tags: insight.meta_tags.clone(),
                scope: if insight.scope.is_empty() {
                    None
                } else {
                    Some(insight.scope.clone())
                },
                evidence: insight.signal.evidence.join("; "),
                created_at: created_at.to_string(),
            },
        })
        .collect()
}

/// Consolidation hook (§4.5, post-write): groups live bullets by
/// `normalize(content)`; within each group of >= 2, the winner (highest
/// `helpful`, tie-break lowest `harmful`) absorbs the losers' counters and
/// is annotated `Aggregated from <K> instances`. Idempotent: a playbook
/// with no duplicate groups passes through unchanged.
pub fn consolidate(bullets: Vec<Bullet>) -> Vec<Bullet> {
    let mut groups: HashMap<String, Vec<Bullet>> = HashMap::new();
    for bullet in bullets {
        groups.entry(normalize(&bullet.content)).or_default().push(bullet);
    }

    let mut consolidated = Vec::new();
    for (_, mut group) in groups {
        if group.len() == 1 {
            consolidated.push(group.pop().unwrap());
            continue;
        }
        group.sort_by(|a, b| b.helpful.cmp(&a.helpful).then_with(|| a.harmful.cmp(&b.harmful)));
        let mut winner = group.remove(0);
        let absorbed = group.len();
        for loser in &group {
            winner.helpful += loser.helpful;
            winner.harmful += loser.harmful;
        }
        winner.aggregated_from = Some(winner.aggregated_from.unwrap_or(0) + absorbed as u32 + 1);
        consolidated.push(winner);
    }
    consolidated
}

/// Bullet-counter update (§4.5): sums helpful/harmful feedback per
/// `bullet_id` from a closed trace. Bullets missing from the playbook are
/// tolerated by the Knowledge Store's `increment_counters` (no-op there),
/// not here.
pub fn counter_updates_from_trace(trace: &ExecutionTrace) -> HashMap<BulletId, (u32, u32)> {
    let mut increments: HashMap<BulletId, (u32, u32)> = HashMap::new();
    for feedback in &trace.bullet_feedback {
        let Ok(bullet_id) = BulletId::try_new(feedback.bullet_id.clone()) else {
            continue;
        };
        let entry = increments.entry(bullet_id).or_insert((0, 0));
        match feedback.feedback {
            Feedback::Helpful => entry.0 += 1,
            Feedback::Harmful => entry.1 += 1,
            Feedback::Ignored => {}
        }
    }
    increments
}

/// Harmful-bullet archival (§4.5): bullets with `harmful >= threshold` are
/// excised from the live set and appended to the shared archive file,
/// verbatim. Returns the remaining live bullets.
pub fn archive_harmful(
    bullets: Vec<Bullet>,
    threshold: u32,
    archived_at: &str,
    archive: &Archive,
) -> Result<Vec<Bullet>, StoreError> {
    let mut remaining = Vec::new();
    for bullet in bullets {
        if bullet.harmful >= threshold {
            archive.append(&bullet, ArchiveReason::Harmful, archived_at)?;
        } else {
            remaining.push(bullet);
        }
    }
    Ok(remaining)
}
