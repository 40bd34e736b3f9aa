#![forbid(unsafe_code)]

//! The Reflector (§4.4): turns execution traces into insights.
//!
//! Pure functions only — no learning, no state beyond its inputs.

use std::collections::{BTreeSet, HashMap};

use lore_core::model::{ExecutionTrace, Feedback, Insight, InsightSignal, InsightSource, NormalizedError, Severity, Tool};
use lore_core::InsightId;

fn tool_name(tool: Tool) -> &'static str {
    match tool {
        Tool::Tsc => "tsc",
        Tool::Eslint => "eslint",
        Tool::Vitest => "vitest",
        Tool::Unknown => "unknown",
    }
}

/// Tool-specific normalization: known error shapes collapse to a canonical
/// label; anything else falls back to the lexically normalized message.
fn derive_pattern(tool: Tool, error: &NormalizedError) -> String {
    let message = error.message.to_lowercase();
    let is_type_error = error
        .code
        .as_deref()
        .map(|code| matches!(code, "TS2322" | "TS2345" | "TS2339"))
        .unwrap_or(false)
        || message.contains("is not assignable to type")
        || message.contains("type mismatch");
    let is_module_error = message.contains("cannot find module")
        || message.contains("has no exported member")
        || message.contains("no-unresolved");

    match tool {
        Tool::Tsc if is_type_error => "type-mismatch".to_string(),
        Tool::Tsc | Tool::Eslint if is_module_error => "module-resolution-error".to_string(),
        Tool::Vitest if message.contains("expected") && message.contains("received") => {
            "assertion-mismatch".to_string()
        }
        _ => lore_core::normalize::normalize(&message),
    }
}

fn meta_tags_for(tool: Tool, pattern: &str) -> Vec<String> {
    let mut tags = Vec::new();
    match tool {
        Tool::Tsc => tags.push("type".to_string()),
        Tool::Eslint => tags.push("lint".to_string()),
        Tool::Vitest => tags.push("test".to_string()),
        Tool::Unknown => {}
    }
    if pattern.contains("module-resolution") {
        tags.push("dependency".to_string());
    }
    tags
}

/// Confidence model (§4.4): a pure function of frequency and spread, no
/// learning. `online_eligible` is the caller's job (`confidence >= 0.8`).
pub fn confidence_score(
    error_count: usize,
    work_item_count: usize,
    distinct_file_count: usize,
    all_severity_error: bool,
) -> f64 {
    let mut score = (error_count as f64 / 5.0).min(1.0);
    if work_item_count >= 3 {
        score += 0.2;
    }
    if work_item_count >= 5 {
        score += 0.1;
    }
    if distinct_file_count >= 3 {
        score += 0.1;
    }
    if all_severity_error {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

struct Group<'a> {
    tool: Tool,
    errors: Vec<&'a NormalizedError>,
}

/// Single-trace mode (§4.4): one insight per (tool, pattern) pair among the
/// trace's failed results, plus the discovery-chain and harmful-feedback
/// insights when their triggers fire.
pub fn reflect_single(trace: &ExecutionTrace) -> Vec<Insight> {
    let mut groups: HashMap<(Tool, String), Group<'_>> = HashMap::new();

    for result in trace.failed_results() {
        for error in &result.errors {
            let pattern = derive_pattern(error.tool, error);
            groups
                .entry((error.tool, pattern))
                .or_insert_with(|| Group {
                    tool: error.tool,
                    errors: Vec::new(),
                })
                .errors
                .push(error);
        }
    }

    let mut insights = Vec::new();
    let mut keys: Vec<_> = groups.keys().cloned().collect();
    keys.sort();

    for key in keys {
        let (tool, pattern) = key;
        let group = &groups[&(tool, pattern.clone())];
        let files: BTreeSet<&str> = group
            .errors
            .iter()
            .filter_map(|err| err.file.as_deref())
            .collect();
        let all_severity_error = group.errors.iter().all(|err| err.severity == Severity::Error);
        let confidence = confidence_score(group.errors.len(), 1, files.len(), all_severity_error);

        insights.push(Insight {
            id: InsightId::new(),
            timestamp: trace.timestamp.clone(),
            task_id: trace.bead_id.clone(),
            source: InsightSource {
                runner: tool_name(tool).to_string(),
                work_item_ids: vec![trace.bead_id.clone()],
            },
            signal: InsightSignal {
                pattern: pattern.clone(),
                evidence: group.errors.iter().map(|err| err.message.clone()).collect(),
            },
            recommendation: format!("Address recurring {} failures: {pattern}", tool_name(tool)),
            scope: files.into_iter().map(str::to_string).collect(),
            confidence,
            online_eligible: confidence >= 0.8,
            meta_tags: meta_tags_for(tool, &pattern),
        });
    }

    if !trace.discovered_issues.is_empty() {
        let confidence = if trace.discovered_issues.len() >= 3 { 0.85 } else { 0.65 };
        let mut work_item_ids = vec![trace.bead_id.clone()];
        work_item_ids.extend(trace.discovered_issues.iter().cloned());
        insights.push(Insight {
            id: InsightId::new(),
            timestamp: trace.timestamp.clone(),
            task_id: trace.bead_id.clone(),
            source: InsightSource {
                runner: "reflector".to_string(),
                work_item_ids,
            },
            signal: InsightSignal {
                pattern: "discovery-chain".to_string(),
                evidence: trace.discovered_issues.clone(),
            },
            recommendation: "Investigate the chain of discovered issues".to_string(),
            scope: Vec::new(),
            confidence,
            online_eligible: confidence >= 0.8,
            meta_tags: vec!["discovery".to_string()],
        });
    }

    let harmful: Vec<_> = trace
        .bullet_feedback
        .iter()
        .filter(|feedback| feedback.feedback == Feedback::Harmful)
        .collect();
    if !harmful.is_empty() {
        insights.push(Insight {
            id: InsightId::new(),
            timestamp: trace.timestamp.clone(),
            task_id: trace.bead_id.clone(),
            source: InsightSource {
                runner: "reflector".to_string(),
                work_item_ids: vec![trace.bead_id.clone()],
            },
            signal: InsightSignal {
                pattern: "harmful-bullet-feedback".to_string(),
                evidence: harmful.iter().map(|fb| fb.bullet_id.clone()).collect(),
            },
            recommendation: "Review bullets marked harmful during this task".to_string(),
            scope: Vec::new(),
            confidence: 0.75,
            online_eligible: false,
            meta_tags: vec!["harmful-feedback".to_string()],
        });
    }

    insights
}

/// `quote`/digit-stripped, lexically normalized, truncated error signature
/// used as the batch clustering key's `errorPattern` component.
fn error_pattern_signature(message: &str) -> String {
    let stripped: String = message
        .chars()
        .filter(|ch| *ch != '"' && *ch != '\'' && !ch.is_ascii_digit())
        .collect();
    lore_core::normalize::normalize(&stripped)
        .chars()
        .take(80)
        .collect()
}

/// Digit-stripped file signature used as the batch clustering key's
/// `filePattern` component, so numbered siblings (`file1.ts`, `file2.ts`,
/// ...) collapse to the same pattern instead of fragmenting the cluster
/// (§4.4 batch mode, scenario S6).
fn file_pattern_signature(file: Option<&str>) -> String {
    let Some(file) = file else {
        return String::new();
    };
    file.chars().filter(|ch| !ch.is_ascii_digit()).collect()
}

struct Cluster {
    tool: Tool,
    error_pattern: String,
    work_items: BTreeSet<String>,
    threads: BTreeSet<String>,
    files: BTreeSet<String>,
    evidence: Vec<String>,
    error_count: usize,
    all_severity_error: bool,
    latest_timestamp: String,
}

/// Batch mode (§4.4): clusters errors across traces by `(errorPattern,
/// toolPattern, filePattern)`, emitting one insight per cluster with
/// frequency (distinct contributing beads) >= 2. Thread-context enrichment
/// boosts confidence when the cluster is confined to (or spans) threads.
pub fn reflect_batch(traces: &[ExecutionTrace]) -> Vec<Insight> {
    let mut clusters: HashMap<(Tool, String, String), Cluster> = HashMap::new();

    for trace in traces {
        for result in trace.failed_results() {
            for error in &result.errors {
                let error_pattern = error_pattern_signature(&error.message);
                let file_pattern = file_pattern_signature(error.file.as_deref());
                let key = (error.tool, error_pattern.clone(), file_pattern);
                let cluster = clusters.entry(key).or_insert_with(|| Cluster {
                    tool: error.tool,
                    error_pattern: error_pattern.clone(),
                    work_items: BTreeSet::new(),
                    threads: BTreeSet::new(),
                    files: BTreeSet::new(),
                    evidence: Vec::new(),
                    error_count: 0,
                    all_severity_error: true,
                    latest_timestamp: trace.timestamp.clone(),
                });
                cluster.work_items.insert(trace.bead_id.clone());
                if let Some(thread_id) = &trace.thread_id {
                    cluster.threads.insert(thread_id.clone());
                }
                if let Some(file) = &error.file {
                    cluster.files.insert(file.clone());
                }
                cluster.evidence.push(error.message.clone());
                cluster.error_count += 1;
                cluster.all_severity_error &= error.severity == Severity::Error;
                if trace.timestamp > cluster.latest_timestamp {
                    cluster.latest_timestamp = trace.timestamp.clone();
                }
            }
        }
    }

    let mut insights = Vec::new();
    let mut keys: Vec<_> = clusters.keys().cloned().collect();
    keys.sort();

    for key in keys {
        let cluster = &clusters[&key];
        if cluster.work_items.len() < 2 {
            continue;
        }
        let mut confidence = confidence_score(
            cluster.error_count,
            cluster.work_items.len(),
            cluster.files.len(),
            cluster.all_severity_error,
        );
        let mut meta_tags = meta_tags_for(cluster.tool, &cluster.error_pattern);
        meta_tags.push("recurring-error".to_string());
        if cluster.threads.len() == 1 {
            confidence = (confidence * 1.2).min(1.0);
            meta_tags.push("thread-specific".to_string());
        } else if cluster.threads.len() >= 2 {
            confidence = (confidence * 1.5).min(1.0);
            meta_tags.push("systemic".to_string());
        }

        insights.push(Insight {
            id: InsightId::new(),
            timestamp: cluster.latest_timestamp.clone(),
            task_id: cluster.work_items.iter().next().cloned().unwrap_or_default(),
            source: InsightSource {
                runner: tool_name(cluster.tool).to_string(),
                work_item_ids: cluster.work_items.iter().cloned().collect(),
            },
            signal: InsightSignal {
                pattern: cluster.error_pattern.clone(),
                evidence: cluster.evidence.clone(),
            },
            recommendation: format!(
                "Recurring {} failures across {} tasks: {}",
                tool_name(cluster.tool),
                cluster.work_items.len(),
                cluster.error_pattern
            ),
            scope: cluster.files.iter().cloned().collect(),
            confidence,
            online_eligible: confidence >= 0.8,
            meta_tags,
        });
    }

    insights
}
