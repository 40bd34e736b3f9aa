#![forbid(unsafe_code)]

//! JSON/human rendering of a cycle's outcome (§7: success object carries
//! `accepted`, `rejected[].reason`, `bulletsAdded`, `bulletsPruned`,
//! `netScoreChange`).

use lore_engine::{CycleSummary, RejectedDelta};
use serde::Serialize;

#[derive(Serialize)]
pub struct RejectedReport {
    #[serde(rename = "deltaId")]
    pub delta_id: String,
    pub reason: &'static str,
}

#[derive(Serialize)]
pub struct CycleReport {
    #[serde(rename = "insightsExtracted")]
    pub insights_extracted: usize,
    pub accepted: Vec<String>,
    pub rejected: Vec<RejectedReport>,
    #[serde(rename = "bulletsAdded")]
    pub bullets_added: usize,
    #[serde(rename = "bulletsPruned")]
    pub bullets_pruned: usize,
    #[serde(rename = "netScoreChange")]
    pub net_score_change: i64,
    #[serde(rename = "candidateAccepted")]
    pub candidate_accepted: bool,
}

impl From<CycleSummary> for CycleReport {
    fn from(summary: CycleSummary) -> Self {
        Self {
            insights_extracted: summary.insights_extracted,
            accepted: summary.accepted.iter().map(|id| id.as_uuid().to_string()).collect(),
            rejected: summary
                .rejected
                .into_iter()
                .map(|RejectedDelta { delta_id, reason }| RejectedReport {
                    delta_id: delta_id.as_uuid().to_string(),
                    reason: reason.as_str(),
                })
                .collect(),
            bullets_added: summary.bullets_added,
            bullets_pruned: summary.bullets_pruned,
            net_score_change: summary.net_score_change,
            candidate_accepted: summary.candidate_accepted,
        }
    }
}

impl CycleReport {
    pub fn print_human(&self) {
        println!("insights extracted: {}", self.insights_extracted);
        println!("candidate accepted: {}", self.candidate_accepted);
        println!("bullets added:      {}", self.bullets_added);
        println!("bullets pruned:     {}", self.bullets_pruned);
        println!("net score change:   {}", self.net_score_change);
        println!("deltas accepted:    {}", self.accepted.len());
        if self.rejected.is_empty() {
            println!("deltas rejected:    0");
        } else {
            println!("deltas rejected:    {}", self.rejected.len());
            for rejected in &self.rejected {
                println!("  - {} ({})", rejected.delta_id, rejected.reason);
            }
        }
    }
}
