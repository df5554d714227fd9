use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::InputError;
use crate::score::SignalScoreMap;
use crate::MAX_CONFIDENCE;

/// Identifies one of the signal strategies feeding the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    Frequency,
    Recency,
    StructuralPattern,
    Stochastic,
}

impl StrategyId {
    pub const ALL: [StrategyId; 4] = [
        StrategyId::Frequency,
        StrategyId::Recency,
        StrategyId::StructuralPattern,
        StrategyId::Stochastic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Frequency => "frequency",
            StrategyId::Recency => "recency",
            StrategyId::StructuralPattern => "structural_pattern",
            StrategyId::Stochastic => "stochastic",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| InputError::UnknownStrategy(s.to_string()))
    }
}

/// Output of one signal generator for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy_id: StrategyId,
    /// Top `domain.count` candidates in rank order.
    pub ranked_candidates: Vec<u32>,
    /// In [0, 0.99].
    pub confidence: f64,
    pub score_map: SignalScoreMap,
}

impl StrategyResult {
    /// Rank a score map and derive the strategy's own confidence.
    ///
    /// Confidence is the gap between the mean normalized score of the selected
    /// candidates and the mean of everything left out. A flat map scores 0.
    pub fn from_scores(strategy_id: StrategyId, score_map: SignalScoreMap, domain: &Domain) -> Self {
        let ranked_candidates = score_map.top_k(domain.count as usize);

        let (mut sel_sum, mut rest_sum, mut rest_n) = (0.0, 0.0, 0usize);
        for c in domain.candidates() {
            let s = score_map.normalized(c);
            if ranked_candidates.contains(&c) {
                sel_sum += s;
            } else {
                rest_sum += s;
                rest_n += 1;
            }
        }
        let sel_mean = if ranked_candidates.is_empty() {
            0.0
        } else {
            sel_sum / ranked_candidates.len() as f64
        };
        let rest_mean = if rest_n == 0 { 0.0 } else { rest_sum / rest_n as f64 };
        let confidence = (sel_mean - rest_mean).clamp(0.0, MAX_CONFIDENCE);

        Self {
            strategy_id,
            ranked_candidates,
            confidence,
            score_map,
        }
    }
}

/// Non-negative weight per strategy. Consumers normalize by the sum and never
/// assume it is 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<StrategyId, f64>);

impl WeightVector {
    /// Build from explicit weights, rejecting negative or non-finite values.
    pub fn new(weights: impl IntoIterator<Item = (StrategyId, f64)>) -> Result<Self, InputError> {
        let v = Self(weights.into_iter().collect());
        v.validate()?;
        Ok(v)
    }

    /// Build from computed values; anything negative or non-finite is stored as 0.
    pub fn from_shares(weights: impl IntoIterator<Item = (StrategyId, f64)>) -> Self {
        Self(
            weights
                .into_iter()
                .map(|(id, w)| (id, if w.is_finite() && w > 0.0 { w } else { 0.0 }))
                .collect(),
        )
    }

    /// Equal weight for each listed strategy.
    pub fn equal(ids: impl IntoIterator<Item = StrategyId>) -> Self {
        Self(ids.into_iter().map(|id| (id, 1.0)).collect())
    }

    pub fn validate(&self) -> Result<(), InputError> {
        for (id, &w) in &self.0 {
            if !w.is_finite() || w < 0.0 {
                return Err(InputError::InvalidWeight {
                    strategy: id.to_string(),
                    weight: w,
                });
            }
        }
        Ok(())
    }

    /// Raw weight, 0 for strategies the vector omits.
    pub fn get(&self, id: StrategyId) -> f64 {
        self.0.get(&id).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Fraction of the total held by `id`; 0 when the vector sums to 0.
    pub fn share(&self, id: StrategyId) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        self.get(id) / total
    }

    /// The same proportions rescaled to sum to 1 (unchanged when the sum is 0).
    pub fn normalized(&self) -> WeightVector {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        Self(self.0.iter().map(|(&id, &w)| (id, w / total)).collect())
    }

    pub fn strategies(&self) -> impl Iterator<Item = StrategyId> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrategyId, f64)> + '_ {
        self.0.iter().map(|(&id, &w)| (id, w))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::equal(StrategyId::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_id_round_trips_through_str() {
        for id in StrategyId::ALL {
            assert_eq!(id.as_str().parse::<StrategyId>().unwrap(), id);
        }
        assert!("lstm".parse::<StrategyId>().is_err());
    }

    #[test]
    fn negative_weight_rejected() {
        let err = WeightVector::new([(StrategyId::Frequency, -1.0)]).unwrap_err();
        assert!(matches!(err, InputError::InvalidWeight { .. }));
    }

    #[test]
    fn from_shares_clamps_to_zero() {
        let w = WeightVector::from_shares([
            (StrategyId::Frequency, -3.0),
            (StrategyId::Recency, f64::INFINITY),
            (StrategyId::Stochastic, 2.0),
        ]);
        assert_eq!(w.get(StrategyId::Frequency), 0.0);
        assert_eq!(w.get(StrategyId::Recency), 0.0);
        assert_eq!(w.share(StrategyId::Stochastic), 1.0);
    }

    #[test]
    fn shares_do_not_assume_unit_sum() {
        let w = WeightVector::new([(StrategyId::Frequency, 3.0), (StrategyId::Recency, 1.0)]).unwrap();
        assert_eq!(w.share(StrategyId::Frequency), 0.75);
        assert_eq!(w.get(StrategyId::Stochastic), 0.0);
        let n = w.normalized();
        assert!((n.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn flat_scores_have_zero_confidence() {
        let domain = Domain::new("d", 2, 1, 6);
        let map = SignalScoreMap::from_scores(domain.candidates().map(|c| (c, 0.5)));
        let r = StrategyResult::from_scores(StrategyId::Recency, map, &domain);
        assert_eq!(r.ranked_candidates, vec![1, 2]);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn peaked_scores_have_high_confidence() {
        let domain = Domain::new("d", 1, 1, 5);
        let map = SignalScoreMap::from_scores([(3, 1.0)]);
        let r = StrategyResult::from_scores(StrategyId::Frequency, map, &domain);
        assert_eq!(r.ranked_candidates, vec![3]);
        assert!((r.confidence - MAX_CONFIDENCE).abs() < 1e-12);
    }
}
