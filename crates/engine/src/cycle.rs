#![forbid(unsafe_code)]

//! Cycle orchestration: `startTask` loads bullets into a Generator session,
//! the session emits traces, and `run_cycle` sequences Reflector -> Curator
//! -> Merger -> Evaluator -> Knowledge Store commit-or-revert (§2).

use lore_core::ids::DeltaId;
use lore_core::model::{ExecutionTrace, Insight};
use lore_core::Config;
use lore_store::{Archive, DeltaQueue, InsightStore, KnowledgeStore, TraceStore};

use crate::merger::RejectedDelta;
use crate::{curator, evaluator, merger, reflector};
use crate::error::EngineError;

/// Everything a cycle needs to read and write; each field is the sole
/// writer of its own file (§3 Ownership), so `run_cycle` never opens a file
/// directly — only through these collaborators.
pub struct CycleContext<'a> {
    pub store: &'a KnowledgeStore,
    pub queue: &'a DeltaQueue,
    pub insights: &'a InsightStore,
    pub traces: &'a TraceStore,
    pub archive: &'a Archive,
    pub config: &'a Config,
    /// Bullets with `harmful >= this` are archived (§4.5; open question
    /// resolved in DESIGN.md: checked after consolidation, same as
    /// pruning).
    pub harmful_archive_threshold: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CycleSummary {
    pub insights_extracted: usize,
    pub accepted: Vec<DeltaId>,
    pub rejected: Vec<RejectedDelta>,
    pub bullets_added: usize,
    pub bullets_pruned: usize,
    pub net_score_change: i64,
    pub candidate_accepted: bool,
}

/// Runs one full learning cycle. `now` is supplied by the caller rather
/// than read from the wall clock here, so the pipeline stays a pure
/// function of its file inputs plus this one timestamp (§9 determinism).
pub fn run_cycle(ctx: &CycleContext<'_>, now: &str) -> Result<CycleSummary, EngineError> {
    let trace_outcome = {
        let _span = tracing::info_span!("reflect").entered();
        ctx.traces.read_all()?
    };

    let mut fresh_insights: Vec<Insight> = Vec::new();
    for trace in &trace_outcome.traces {
        fresh_insights.extend(reflector::reflect_single(trace));
    }
    fresh_insights.extend(reflector::reflect_batch(&trace_outcome.traces));
    for insight in &fresh_insights {
        ctx.insights.append(insight)?;
    }
    let insights_extracted = fresh_insights.len();

    let deltas = {
        let _span = tracing::info_span!("curate").entered();
        let insight_outcome = ctx.insights.read_all()?;
        let eligible = curator::eligible_insights(&insight_outcome.insights, ctx.config.learning.confidence_min);
        let deduped = curator::dedupe_by_pattern(eligible);
        curator::insights_to_deltas(&deduped, ctx.config.max_deltas_per_session, now)
    };
    ctx.queue.enqueue(deltas)?;

    let existing = ctx.store.load_bullets()?;
    let manifest = ctx.store.load_manifest()?;

    let merge_outcome = {
        let _span = tracing::info_span!("merge").entered();
        let pending = ctx.queue.read()?;
        merger::merge(&existing, &pending, ctx.config.learning.confidence_min)
    };

    let consolidated = curator::consolidate(merge_outcome.bullets);
    let candidate_bullets = curator::archive_harmful(consolidated, ctx.harmful_archive_threshold, now, ctx.archive)?;

    let (current_stats, candidate_stats, candidate_accepted) = {
        let _span = tracing::info_span!("evaluate").entered();
        let current_stats = evaluator::evaluate(&existing);
        let candidate_stats = evaluator::evaluate(&candidate_bullets);
        let candidate_accepted = evaluator::accepts(&candidate_stats, &current_stats);
        (current_stats, candidate_stats, candidate_accepted)
    };

    let (accepted, bullets_added, bullets_pruned) = if candidate_accepted {
        ctx.store.write_bullets(&candidate_bullets, manifest.as_ref())?;
        ctx.queue.dequeue(&merge_outcome.accepted_ids)?;
        let added = candidate_bullets.len().saturating_sub(existing.len());
        let pruned = existing.len().saturating_sub(candidate_bullets.len());
        (merge_outcome.accepted_ids, added, pruned)
    } else {
        tracing::info!("candidate playbook rejected, current preserved");
        (Vec::new(), 0, 0)
    };

    Ok(CycleSummary {
        insights_extracted,
        accepted,
        rejected: merge_outcome.rejected,
        bullets_added,
        bullets_pruned,
        net_score_change: candidate_stats.net_score - current_stats.net_score,
        candidate_accepted,
    })
}

/// Bullet-counter ingestion from a closed trace, followed by the
/// consolidation hook (§4.5 supplemented: the hook runs after *every*
/// counter-update ingestion, not just after delta application).
pub fn ingest_trace_feedback(store: &KnowledgeStore, trace: &ExecutionTrace) -> Result<(), EngineError> {
    let increments = curator::counter_updates_from_trace(trace);
    store.increment_counters(&increments)?;

    let bullets = store.load_bullets()?;
    let manifest = store.load_manifest()?;
    let consolidated = curator::consolidate(bullets);
    store.write_bullets(&consolidated, manifest.as_ref())?;
    Ok(())
}
