#![forbid(unsafe_code)]

//! The Evaluator (§4.6): scores a playbook and decides whether a candidate
//! replaces the current one.

use std::collections::BTreeMap;

use lore_core::model::Bullet;

/// Per-playbook statistics (§4.6, supplemented with the full top-5/bottom-5
/// and section distribution fields the distillation only named in passing).
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybookStats {
    pub total_bullets: usize,
    pub avg_helpful: f64,
    pub avg_harmful: f64,
    pub net_score: i64,
    pub section_distribution: BTreeMap<String, usize>,
    pub top_bullets: Vec<Bullet>,
    pub bottom_bullets: Vec<Bullet>,
}

pub fn evaluate(bullets: &[Bullet]) -> PlaybookStats {
    let total_bullets = bullets.len();
    let (sum_helpful, sum_harmful) = bullets
        .iter()
        .fold((0i64, 0i64), |(h, m), b| (h + i64::from(b.helpful), m + i64::from(b.harmful)));

    let avg_helpful = if total_bullets == 0 { 0.0 } else { sum_helpful as f64 / total_bullets as f64 };
    let avg_harmful = if total_bullets == 0 { 0.0 } else { sum_harmful as f64 / total_bullets as f64 };
    let net_score = sum_helpful - sum_harmful;

    let mut section_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for bullet in bullets {
        *section_distribution.entry(bullet.section.clone()).or_insert(0) += 1;
    }

    let mut ranked = bullets.to_vec();
    ranked.sort_by(|a, b| b.score().cmp(&a.score()).then_with(|| a.content.cmp(&b.content)));
    let top_bullets = ranked.iter().take(5).cloned().collect();
    let bottom_bullets = ranked.iter().rev().take(5).cloned().collect();

    PlaybookStats {
        total_bullets,
        avg_helpful,
        avg_harmful,
        net_score,
        section_distribution,
        top_bullets,
        bottom_bullets,
    }
}

/// §4.6 acceptance predicate: does `candidate` replace `current`?
pub fn accepts(candidate: &PlaybookStats, current: &PlaybookStats) -> bool {
    if candidate.net_score > current.net_score {
        return true;
    }
    if candidate.net_score == current.net_score && candidate.avg_helpful > current.avg_helpful {
        return true;
    }
    if candidate.total_bullets > current.total_bullets && candidate.avg_helpful >= current.avg_helpful {
        return true;
    }
    false
}

/// §4.6 `prune(threshold = -3)`: deletes every bullet whose `helpful -
/// harmful < threshold`.
pub fn prune(bullets: Vec<Bullet>, threshold: i64) -> Vec<Bullet> {
    bullets.into_iter().filter(|bullet| bullet.score() >= threshold).collect()
}
