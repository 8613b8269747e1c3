//! Hybrid scorer
//!
//! Turns the 0-3 candidates of one query into exactly one [`Decision`]:
//!
//! 1. No candidates: unresolved, confidence 0.
//! 2. One candidate: the decision mirrors it.
//! 3. Several: candidates are grouped by label and each group scores
//!    `Σ weight[source] × confidence`. The best group wins; groups within
//!    `tie_epsilon` of the best are separated by source trust
//!    (llm > vector > rule), then by label. The final confidence is the
//!    winning score divided by the weight sum of all candidates, i.e. the
//!    score the set would reach if every candidate agreed at confidence 1.
//!
//! Candidates are sorted before grouping so the result never depends on the
//! order in which classifiers finished.

use crate::config::{ScoringConfig, SourceWeights};
use crate::types::{clamp_unit, Candidate, Decision, SignalSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Aggregate for one intent label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupScore {
    pub intent: String,
    pub score: f64,
    pub sources: Vec<SignalSource>,
}

/// Decision plus the per-label scores that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDecision {
    pub decision: Decision,
    /// Best group first
    pub groups: Vec<GroupScore>,
}

/// Weighted-vote scorer; cheap to clone and free of I/O
#[derive(Debug, Clone)]
pub struct HybridScorer {
    weights: SourceWeights,
    tie_epsilon: f64,
}

impl Default for HybridScorer {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

struct Group<'a> {
    intent: &'a str,
    score: f64,
    /// Most trusted source present in the group
    top_trust: u8,
    /// Trust of the group's highest-confidence candidate
    lead_trust: u8,
    max_confidence: f64,
    sources: Vec<SignalSource>,
}

impl HybridScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            weights: config.source_weights,
            tie_epsilon: config.tie_epsilon,
        }
    }

    pub fn weights(&self) -> &SourceWeights {
        &self.weights
    }

    /// Score candidates into a decision
    pub fn score(&self, candidates: &[Candidate], decided_at: DateTime<Utc>) -> Decision {
        self.score_detailed(candidates, decided_at).decision
    }

    pub fn score_detailed(
        &self,
        candidates: &[Candidate],
        decided_at: DateTime<Utc>,
    ) -> ScoredDecision {
        let ordered = sanitize_and_sort(candidates);

        match ordered.len() {
            0 => ScoredDecision {
                decision: Decision::unresolved(decided_at),
                groups: Vec::new(),
            },
            1 => {
                let only = &ordered[0];
                ScoredDecision {
                    groups: vec![GroupScore {
                        intent: only.intent_label.clone(),
                        score: self.weights.get(only.source) * only.confidence,
                        sources: vec![only.source],
                    }],
                    decision: Decision {
                        final_intent: Some(only.intent_label.clone()),
                        confidence: only.confidence,
                        contributing_candidates: ordered,
                        decided_at,
                    },
                }
            }
            _ => self.score_many(ordered, decided_at),
        }
    }

    fn score_many(&self, ordered: Vec<Candidate>, decided_at: DateTime<Utc>) -> ScoredDecision {
        let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
        let mut max_possible = 0.0;

        // `ordered` is confidence-descending, so the first candidate seen for
        // a label is that group's lead
        for c in &ordered {
            let weight = self.weights.get(c.source);
            max_possible += weight;

            let group = groups.entry(c.intent_label.as_str()).or_insert_with(|| Group {
                intent: c.intent_label.as_str(),
                score: 0.0,
                top_trust: c.source.trust_rank(),
                lead_trust: c.source.trust_rank(),
                max_confidence: c.confidence,
                sources: Vec::new(),
            });
            group.score += weight * c.confidence;
            group.top_trust = group.top_trust.max(c.source.trust_rank());
            if !group.sources.contains(&c.source) {
                group.sources.push(c.source);
            }
        }

        let mut ranked: Vec<Group> = groups.into_values().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.intent.cmp(b.intent)));

        let best_score = ranked[0].score;
        let winner_idx = ranked
            .iter()
            .enumerate()
            .filter(|(_, g)| best_score - g.score <= self.tie_epsilon)
            .min_by(|(_, a), (_, b)| tie_break(a, b))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let winner = ranked.remove(winner_idx);
        let confidence = if max_possible > 0.0 {
            clamp_unit(winner.score / max_possible)
        } else {
            0.0
        };

        tracing::debug!(
            intent = winner.intent,
            score = winner.score,
            max_possible,
            groups = ranked.len() + 1,
            "Hybrid scorer picked winner"
        );

        let final_intent = winner.intent.to_string();
        let mut summaries = vec![summarize(winner)];
        summaries.extend(ranked.into_iter().map(summarize));

        ScoredDecision {
            decision: Decision {
                final_intent: Some(final_intent),
                confidence,
                contributing_candidates: ordered,
                decided_at,
            },
            groups: summaries,
        }
    }
}

/// Order among groups tied within epsilon; lower sorts first.
///
/// The most trusted source present anywhere in a group decides first, and
/// takes precedence over the source of the group's highest-confidence
/// candidate: a group holding an llm candidate beats vector-only and
/// rule-only groups even when its strongest member came from elsewhere.
/// The lead candidate's source decides next, then max confidence, then label.
fn tie_break(a: &Group, b: &Group) -> Ordering {
    b.top_trust
        .cmp(&a.top_trust)
        .then_with(|| b.lead_trust.cmp(&a.lead_trust))
        .then_with(|| b.max_confidence.total_cmp(&a.max_confidence))
        .then_with(|| a.intent.cmp(b.intent))
}

fn summarize(group: Group) -> GroupScore {
    let mut sources = group.sources;
    sources.sort_by(|a, b| b.trust_rank().cmp(&a.trust_rank()));
    GroupScore {
        intent: group.intent.to_string(),
        score: group.score,
        sources,
    }
}

/// Drop unlabeled candidates, clamp confidences, and fix a total order
fn sanitize_and_sort(candidates: &[Candidate]) -> Vec<Candidate> {
    let mut ordered: Vec<Candidate> = candidates
        .iter()
        .filter(|c| {
            let keep = !c.intent_label.trim().is_empty();
            if !keep {
                tracing::warn!(source = %c.source, "Dropping candidate with empty intent label");
            }
            keep
        })
        .map(|c| Candidate {
            confidence: clamp_unit(c.confidence),
            ..c.clone()
        })
        .collect();

    ordered.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.source.trust_rank().cmp(&a.source.trust_rank()))
            .then_with(|| a.intent_label.cmp(&b.intent_label))
            .then_with(|| a.latency_ms.cmp(&b.latency_ms))
    });
    ordered
}
