//! Confidence of a combined prediction.
//!
//! `confidence = agreement * volume_factor * pattern_boost`, clamped to
//! `[0, MAX_CONFIDENCE]`:
//!
//! - agreement: fraction of candidate pairs on whose ordering a strict
//!   majority of strategies agree
//! - volume_factor: `min(history_len / volume_target, 1)`
//! - pattern_boost: `1 + step * strong_patterns`

use std::collections::BTreeSet;

use drawcast_core::config::ConfidenceConfig;
use drawcast_core::{DetectedPattern, StrategyResult, MAX_CONFIDENCE};

#[derive(Debug, Clone, Default)]
pub struct ConfidenceEstimator {
    config: ConfidenceConfig,
}

impl ConfidenceEstimator {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    pub fn estimate(
        &self,
        results: &[StrategyResult],
        patterns: &[DetectedPattern],
        data_volume: usize,
    ) -> f64 {
        let agreement = pairwise_agreement(results);
        let volume = self.volume_factor(data_volume);
        let boost = self.pattern_boost(patterns);

        let confidence = agreement * volume * boost;
        if confidence.is_finite() {
            confidence.clamp(0.0, MAX_CONFIDENCE)
        } else {
            0.0
        }
    }

    pub fn volume_factor(&self, data_volume: usize) -> f64 {
        let target = self.config.volume_target.max(1) as f64;
        (data_volume as f64 / target).min(1.0)
    }

    pub fn pattern_boost(&self, patterns: &[DetectedPattern]) -> f64 {
        let strong = patterns
            .iter()
            .filter(|p| p.confidence > self.config.strong_pattern_threshold)
            .count();
        1.0 + self.config.pattern_boost_step * strong as f64
    }
}

/// Fraction of candidate pairs whose relative order a strict majority of
/// strategies agrees on. 0 with no strategies or fewer than two candidates.
pub fn pairwise_agreement(results: &[StrategyResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }

    let candidates: Vec<u32> = results
        .iter()
        .flat_map(|r| r.score_map.iter().map(|(c, _)| c))
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();
    if candidates.len() < 2 {
        return 0.0;
    }

    let columns: Vec<Vec<f64>> = results
        .iter()
        .map(|r| candidates.iter().map(|&c| r.score_map.get(c)).collect())
        .collect();
    let majority = results.len() / 2 + 1;

    let (mut agreed, mut pairs) = (0u64, 0u64);
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let (mut above, mut below) = (0usize, 0usize);
            for scores in &columns {
                if scores[i] > scores[j] {
                    above += 1;
                } else if scores[i] < scores[j] {
                    below += 1;
                }
            }
            if above >= majority || below >= majority {
                agreed += 1;
            }
            pairs += 1;
        }
    }
    agreed as f64 / pairs as f64
}
