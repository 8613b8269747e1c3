//! Terminal output formatter

use intentroot_core::intents::IntentSummary;
use intentroot_core::memory::RecalledEntry;
use intentroot_core::scorer::GroupScore;
use intentroot_core::{Candidate, Decision, Resolution, ScoredDecision};

const UNRESOLVED: &str = "(unresolved)";

pub fn format_scored(scored: &ScoredDecision) -> String {
    let mut output = format_decision(&scored.decision);
    push_groups(&mut output, &scored.groups);
    output
}

pub fn format_resolution(resolution: &Resolution) -> String {
    let mut output = format_decision(&resolution.decision);
    push_groups(&mut output, &resolution.groups);

    output.push_str("Signals:\n");
    for report in &resolution.reports {
        output.push_str(&format!(
            "  {:<7} {:<24} {:>5}ms\n",
            report.source.as_str(),
            report.status.to_string(),
            report.latency_ms
        ));
    }
    output
}

fn format_decision(decision: &Decision) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Intent:      {}\n",
        decision.final_intent.as_deref().unwrap_or(UNRESOLVED)
    ));
    output.push_str(&format!("Confidence:  {:.3}\n", decision.confidence));

    if !decision.contributing_candidates.is_empty() {
        output.push_str("Candidates:\n");
        for c in &decision.contributing_candidates {
            output.push_str(&format!(
                "  {:<7} {:<24} {:.3}\n",
                c.source.as_str(),
                c.intent_label,
                c.confidence
            ));
        }
    }
    output
}

fn push_groups(output: &mut String, groups: &[GroupScore]) {
    if groups.is_empty() {
        return;
    }
    output.push_str("Scores:\n");
    for g in groups {
        let sources: Vec<&str> = g.sources.iter().map(|s| s.as_str()).collect();
        output.push_str(&format!(
            "  {:<24} {:.3} ({})\n",
            g.intent,
            g.score,
            sources.join(", ")
        ));
    }
}

pub fn format_rule_match(candidate: Option<&Candidate>) -> String {
    match candidate {
        Some(c) => format!("{} ({:.2})\n", c.intent_label, c.confidence),
        None => "No rule matched\n".to_string(),
    }
}

pub fn format_intents(intents: &[IntentSummary]) -> String {
    if intents.is_empty() {
        return "No intents\n".to_string();
    }

    let mut output = String::new();
    for intent in intents {
        output.push_str(&intent.id);
        if let Some(ref title) = intent.title {
            output.push_str(&format!(": {}", title));
        }
        if let Some(ref domain) = intent.domain {
            output.push_str(&format!(" [{}]", domain));
        }
        output.push('\n');
    }
    output
}

pub fn format_recalled(entries: &[RecalledEntry]) -> String {
    if entries.is_empty() {
        return "No matching memories\n".to_string();
    }

    let mut output = String::new();
    for r in entries {
        let score_pct = (r.score * 100.0) as i32;
        output.push_str(&format!(
            "{:>3}% {} {:<9} {}\n",
            score_pct,
            r.entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.entry.role.as_str(),
            r.entry.text
        ));
    }
    output
}
