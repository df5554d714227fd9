use std::collections::BTreeMap;

use drawcast_core::config::PatternConfig;
use drawcast_core::{DetectedPattern, Domain, HistoricalDraw, SignalScoreMap, StrategyId};

use super::SignalGenerator;
use crate::patterns::PatternDetector;

/// Scores candidates by the patterns that mention them.
///
/// Runs its own detection pass over the history it is given, so it stays a
/// pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct StructuralPatternSignal {
    config: PatternConfig,
}

impl StructuralPatternSignal {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }
}

impl SignalGenerator for StructuralPatternSignal {
    fn strategy_id(&self) -> StrategyId {
        StrategyId::StructuralPattern
    }

    fn generate(&self, history: &[HistoricalDraw], domain: &Domain) -> SignalScoreMap {
        let patterns = PatternDetector::new(domain, self.config.clone()).detect(history);
        score_from_patterns(&patterns, domain)
    }
}

/// Sum of the confidences of every pattern whose related set contains the candidate.
pub fn score_from_patterns(patterns: &[DetectedPattern], domain: &Domain) -> SignalScoreMap {
    let mut scores: BTreeMap<u32, f64> = domain.candidates().map(|c| (c, 0.0)).collect();
    for pattern in patterns {
        for c in &pattern.related_candidates {
            if let Some(score) = scores.get_mut(c) {
                *score += pattern.confidence;
            }
        }
    }
    SignalScoreMap::from_scores(scores)
}
