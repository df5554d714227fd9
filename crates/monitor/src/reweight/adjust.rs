//! Weight proposal and validation.
//!
//! The proposal blends each strategy's current share with its
//! accuracy-proportional target:
//!
//! `w' = (1 - learning_rate) * share + learning_rate * acc / sum(acc)`
//!
//! floored at `min_weight` and renormalized to sum to 1. Strategies without
//! a rolling accuracy are scored at the mean of those that have one.

use std::collections::{BTreeMap, BTreeSet};

use drawcast_core::config::ReweightConfig;
use drawcast_core::{StrategyId, WeightVector};

use crate::error::MonitorError;

fn mean_accuracy(accuracies: &BTreeMap<StrategyId, f64>) -> f64 {
    if accuracies.is_empty() {
        return 0.0;
    }
    accuracies.values().sum::<f64>() / accuracies.len() as f64
}

pub fn propose(
    current: &WeightVector,
    accuracies: &BTreeMap<StrategyId, f64>,
    config: &ReweightConfig,
) -> WeightVector {
    let ids: BTreeSet<StrategyId> = current
        .strategies()
        .chain(accuracies.keys().copied())
        .collect();
    if ids.is_empty() || accuracies.is_empty() {
        return current.normalized();
    }

    let fallback = mean_accuracy(accuracies);
    let accuracy = |id: StrategyId| accuracies.get(&id).copied().unwrap_or(fallback);
    let equal_share = 1.0 / ids.len() as f64;
    let share = |id: StrategyId| {
        if current.total() > 0.0 {
            current.share(id)
        } else {
            equal_share
        }
    };

    let accuracy_total: f64 = ids.iter().map(|&id| accuracy(id)).sum();
    let alpha = config.learning_rate.clamp(0.0, 1.0);

    WeightVector::from_shares(ids.iter().map(|&id| {
        let target = if accuracy_total > 0.0 {
            accuracy(id) / accuracy_total
        } else {
            share(id)
        };
        let blended = (1.0 - alpha) * share(id) + alpha * target;
        (id, blended.max(config.min_weight))
    }))
    .normalized()
}

/// Accuracy the ensemble would expect under `weights`.
pub fn expected_accuracy(weights: &WeightVector, accuracies: &BTreeMap<StrategyId, f64>) -> f64 {
    let fallback = mean_accuracy(accuracies);
    if weights.total() <= 0.0 {
        return fallback;
    }
    weights
        .iter()
        .map(|(id, _)| weights.share(id) * accuracies.get(&id).copied().unwrap_or(fallback))
        .sum()
}

/// Reject a proposal that lowers the expected accuracy, or that drops it
/// from at or above the floor to below it. Domains whose accuracies all sit
/// under the floor still get improving proposals.
pub fn validate(prior: f64, proposed: f64, floor: f64) -> Result<(), MonitorError> {
    const TOLERANCE: f64 = 1e-9;
    let regressed = proposed + TOLERANCE < prior;
    let crossed_floor = prior >= floor && proposed < floor;
    if !proposed.is_finite() || regressed || crossed_floor {
        return Err(MonitorError::Rejected {
            proposed,
            prior,
            floor,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accuracies(pairs: &[(StrategyId, f64)]) -> BTreeMap<StrategyId, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn poor_strategy_loses_share() {
        let current = WeightVector::default();
        let acc = accuracies(&[
            (StrategyId::Frequency, 0.1),
            (StrategyId::Recency, 0.5),
            (StrategyId::StructuralPattern, 0.5),
            (StrategyId::Stochastic, 0.5),
        ]);
        let next = propose(&current, &acc, &ReweightConfig::default());

        assert!(next.share(StrategyId::Frequency) < current.share(StrategyId::Frequency));
        assert!(next.share(StrategyId::Recency) > current.share(StrategyId::Recency));
        assert!((next.total() - 1.0).abs() < 1e-12);
        assert!(expected_accuracy(&next, &acc) > expected_accuracy(&current, &acc));
    }

    #[test]
    fn min_weight_keeps_strategies_alive() {
        let current = WeightVector::default();
        let acc = accuracies(&[(StrategyId::Frequency, 0.0), (StrategyId::Recency, 1.0)]);
        let config = ReweightConfig {
            learning_rate: 1.0,
            min_weight: 0.05,
            ..ReweightConfig::default()
        };
        let next = propose(&current, &acc, &config);
        assert!(next.get(StrategyId::Frequency) > 0.0);
    }

    #[test]
    fn zero_learning_rate_keeps_shares() {
        let current = WeightVector::new([(StrategyId::Frequency, 3.0), (StrategyId::Recency, 1.0)]).unwrap();
        let acc = accuracies(&[(StrategyId::Frequency, 0.1), (StrategyId::Recency, 0.9)]);
        let config = ReweightConfig {
            learning_rate: 0.0,
            ..ReweightConfig::default()
        };
        let next = propose(&current, &acc, &config);
        assert!((next.get(StrategyId::Frequency) - 0.75).abs() < 1e-12);
        assert!((next.get(StrategyId::Recency) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn no_accuracies_leave_weights_alone() {
        let current = WeightVector::new([(StrategyId::Frequency, 2.0), (StrategyId::Recency, 2.0)]).unwrap();
        let next = propose(&current, &BTreeMap::new(), &ReweightConfig::default());
        assert_eq!(next, current.normalized());
    }

    #[test]
    fn all_zero_current_weights_start_equal() {
        let current = WeightVector::new([(StrategyId::Frequency, 0.0), (StrategyId::Recency, 0.0)]).unwrap();
        let acc = accuracies(&[(StrategyId::Frequency, 0.5), (StrategyId::Recency, 0.5)]);
        let next = propose(&current, &acc, &ReweightConfig::default());
        assert!((next.get(StrategyId::Frequency) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn validation_rules() {
        assert!(validate(0.4, 0.45, 0.2).is_ok());
        assert!(validate(0.4, 0.4, 0.2).is_ok());
        assert!(matches!(validate(0.4, 0.35, 0.2), Err(MonitorError::Rejected { .. })));
        assert!(validate(0.1, 0.15, 0.2).is_ok());
        assert!(validate(0.1, 0.1, 0.2).is_ok());
        assert!(validate(0.1, 0.09, 0.2).is_err());
        assert!(validate(0.2, 0.2 - 1e-12, 0.2).is_err());
        assert!(validate(0.1, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn improvement_below_floor_is_accepted() {
        let current = WeightVector::default();
        let acc = accuracies(&[
            (StrategyId::Frequency, 0.1),
            (StrategyId::Recency, 0.15),
            (StrategyId::StructuralPattern, 0.15),
            (StrategyId::Stochastic, 0.15),
        ]);
        let config = ReweightConfig::default();
        let next = propose(&current, &acc, &config);
        let prior = expected_accuracy(&current, &acc);
        let proposed = expected_accuracy(&next, &acc);

        assert!(proposed < config.accuracy_floor);
        assert!(proposed > prior);
        assert!(validate(prior, proposed, config.accuracy_floor).is_ok());
        assert!(next.share(StrategyId::Frequency) < current.share(StrategyId::Frequency));
    }
}
