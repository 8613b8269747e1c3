//! Facet-weighted similarity

use crate::config::{FacetCombination, VectorConfig};
use std::collections::BTreeMap;

/// Combines per-facet similarities with static facet weights
#[derive(Debug, Clone, PartialEq)]
pub struct FacetScorer {
    weights: BTreeMap<String, f64>,
    combination: FacetCombination,
}

impl FacetScorer {
    pub fn new(weights: BTreeMap<String, f64>, combination: FacetCombination) -> Self {
        Self {
            weights,
            combination,
        }
    }

    pub fn from_config(config: &VectorConfig) -> Self {
        Self::new(config.facet_weights.clone(), config.combination)
    }

    /// Scorer that only looks at one facet
    pub fn single(facet: impl Into<String>) -> Self {
        Self::new(
            BTreeMap::from([(facet.into(), 1.0)]),
            FacetCombination::WeightedSum,
        )
    }

    pub fn weight(&self, facet: &str) -> f64 {
        self.weights.get(facet).copied().unwrap_or(0.0)
    }

    /// Fold facet similarities into [0, 1]
    ///
    /// Only facets that both carry a positive weight and appear in `scores`
    /// take part; negative similarities count as 0 and non-finite ones are
    /// skipped.
    pub fn combine(&self, scores: &BTreeMap<String, f32>) -> f64 {
        let present: Vec<(f64, f64)> = scores
            .iter()
            .filter_map(|(facet, &score)| {
                let weight = self.weight(facet);
                (weight > 0.0 && score.is_finite())
                    .then(|| (weight, (score as f64).clamp(0.0, 1.0)))
            })
            .collect();

        if present.is_empty() {
            return 0.0;
        }

        match self.combination {
            FacetCombination::WeightedSum => {
                let total_weight: f64 = present.iter().map(|(w, _)| w).sum();
                let weighted: f64 = present.iter().map(|(w, s)| w * s).sum();
                (weighted / total_weight).clamp(0.0, 1.0)
            }
            FacetCombination::WeightedMax => {
                let max_weight = present.iter().map(|(w, _)| *w).fold(0.0, f64::max);
                present
                    .iter()
                    .map(|(w, s)| (w / max_weight) * s)
                    .fold(0.0, f64::max)
            }
        }
    }
}
