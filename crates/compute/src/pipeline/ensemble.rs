//! Weighted combination of strategy results into one ranked selection.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use drawcast_core::{
    rank_descending, CombinedPrediction, Domain, StrategyResult, WeightVector,
    EQUAL_WEIGHT_FALLBACK, MAX_CONFIDENCE,
};

/// Combines the results of several strategies under a weight vector.
///
/// The combined score of a candidate is the weighted sum of its normalized
/// score in each strategy. Weights are normalized over the strategies
/// actually present; when they sum to zero every strategy gets `1/n` and the
/// breakdown carries an [`EQUAL_WEIGHT_FALLBACK`] marker.
#[derive(Debug, Clone)]
pub struct EnsembleCombiner {
    domain: Domain,
}

impl EnsembleCombiner {
    pub fn new(domain: &Domain) -> Self {
        Self {
            domain: domain.clone(),
        }
    }

    /// Effective weight of each result, aligned with `results`, and whether
    /// the equal-weight fallback applied.
    pub fn effective_weights(results: &[StrategyResult], weights: &WeightVector) -> (Vec<f64>, bool) {
        if results.is_empty() {
            return (Vec::new(), false);
        }
        let raw: Vec<f64> = results.iter().map(|r| weights.get(r.strategy_id)).collect();
        let total: f64 = raw.iter().sum();
        if total > 0.0 && total.is_finite() {
            (raw.into_iter().map(|w| w / total).collect(), false)
        } else {
            let equal = 1.0 / results.len() as f64;
            (vec![equal; results.len()], true)
        }
    }

    /// Combined score of every candidate in the domain.
    pub fn combined_scores(&self, results: &[StrategyResult], effective: &[f64]) -> BTreeMap<u32, f64> {
        let mut combined: BTreeMap<u32, f64> = self.domain.candidates().map(|c| (c, 0.0)).collect();
        for (result, &w) in results.iter().zip(effective) {
            let max = result.score_map.max_score();
            if max <= 0.0 || w == 0.0 {
                continue;
            }
            for (c, score) in combined.iter_mut() {
                *score += w * result.score_map.get(*c) / max;
            }
        }
        combined
    }

    pub fn combine(&self, results: &[StrategyResult], weights: &WeightVector) -> CombinedPrediction {
        let (effective, fallback) = Self::effective_weights(results, weights);
        let combined = self.combined_scores(results, &effective);

        let mut selected: Vec<u32> = rank_descending(combined)
            .into_iter()
            .take(self.domain.count as usize)
            .collect();

        let mut strategy_breakdown: Vec<(String, f64)> = results
            .iter()
            .zip(&effective)
            .map(|(result, &w)| {
                let max = result.score_map.max_score();
                let contribution = if max > 0.0 {
                    selected
                        .iter()
                        .map(|&c| w * result.score_map.get(c) / max)
                        .sum()
                } else {
                    0.0
                };
                (result.strategy_id.as_str().to_string(), contribution)
            })
            .collect();
        if fallback {
            strategy_breakdown.push((EQUAL_WEIGHT_FALLBACK.to_string(), 0.0));
        }

        let confidence: f64 = results
            .iter()
            .zip(&effective)
            .map(|(result, &w)| w * result.confidence)
            .sum();

        selected.sort_unstable();

        CombinedPrediction {
            id: Uuid::new_v4(),
            domain_id: self.domain.id.clone(),
            generated_at: Utc::now(),
            candidates: selected,
            bonus_candidates: Vec::new(),
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, MAX_CONFIDENCE)
            } else {
                0.0
            },
            strategy_breakdown,
        }
    }
}
