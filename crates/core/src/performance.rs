use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::strategy::StrategyId;

/// Post-hoc accuracy of one strategy on one draw instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub strategy_id: StrategyId,
    pub domain_instance_id: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub timestamp: DateTime<Utc>,
}

impl PerformanceSample {
    /// Accuracy lies in `[0, 1]`. NaN does not.
    pub fn has_valid_accuracy(&self) -> bool {
        (0.0..=1.0).contains(&self.accuracy)
    }

    /// Score a predicted set against the numbers actually drawn.
    ///
    /// accuracy = hits / numbers drawn per draw, precision = hits / predicted,
    /// recall = hits / actual.
    pub fn from_outcome(
        strategy_id: StrategyId,
        domain_instance_id: impl Into<String>,
        draw_count: u32,
        predicted: &[u32],
        actual: &[u32],
        timestamp: DateTime<Utc>,
    ) -> Self {
        let hits = predicted.iter().filter(|n| actual.contains(n)).count() as f64;
        let ratio = |den: usize| if den == 0 { 0.0 } else { hits / den as f64 };

        let accuracy = ratio(draw_count as usize);
        let precision = ratio(predicted.len());
        let recall = ratio(actual.len());
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            strategy_id,
            domain_instance_id: domain_instance_id.into(),
            accuracy,
            precision,
            recall,
            f1,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_metrics() {
        let s = PerformanceSample::from_outcome(
            StrategyId::Frequency,
            "pick5#1",
            5,
            &[1, 2, 3, 4, 5],
            &[1, 2, 10, 11, 12],
            Utc::now(),
        );
        assert!((s.accuracy - 0.4).abs() < 1e-12);
        assert!((s.precision - 0.4).abs() < 1e-12);
        assert!((s.recall - 0.4).abs() < 1e-12);
        assert!((s.f1 - 0.4).abs() < 1e-12);
    }

    #[test]
    fn accuracy_range_check() {
        let mut s = PerformanceSample::from_outcome(StrategyId::Frequency, "x", 1, &[1], &[1], Utc::now());
        assert!(s.has_valid_accuracy());
        s.accuracy = 1.5;
        assert!(!s.has_valid_accuracy());
        s.accuracy = f64::NAN;
        assert!(!s.has_valid_accuracy());
    }

    #[test]
    fn no_hits_scores_zero() {
        let s = PerformanceSample::from_outcome(StrategyId::Stochastic, "x", 2, &[1, 2], &[3, 4], Utc::now());
        assert_eq!(s.accuracy, 0.0);
        assert_eq!(s.f1, 0.0);
    }
}
