//! Prediction pipeline.
//!
//! One request flows through four stages:
//!
//! - **Validate**: domain, history, and weights are checked up front.
//! - **Generate**: every signal generator runs in parallel alongside the
//!   pattern detector.
//! - **Combine**: the ensemble combiner merges strategy results under the
//!   current weights.
//! - **Estimate**: the confidence estimator scores the combination.
//!
//! Domains with a bonus pool get a second, independent pass over the bonus
//! numbers.

pub mod backtest;
pub mod confidence;
pub mod ensemble;

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use drawcast_core::config::EngineConfig;
use drawcast_core::{
    CombinedPrediction, DetectedPattern, Domain, HistoricalDraw, InputError, StrategyResult,
    WeightVector,
};

use crate::patterns::PatternDetector;
use crate::signals::{default_generators, run_generators, RandomSource, SignalGenerator};

use self::confidence::ConfidenceEstimator;
use self::ensemble::EnsembleCombiner;

/// Everything one prediction request produced.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub prediction: CombinedPrediction,
    pub patterns: Vec<DetectedPattern>,
    pub strategy_results: Vec<StrategyResult>,
}

/// Runs the full pipeline for one domain.
///
/// Holds no mutable state, so a single predictor can serve concurrent
/// requests.
pub struct Predictor {
    domain: Domain,
    generators: Vec<Box<dyn SignalGenerator>>,
    detector: PatternDetector,
    estimator: ConfidenceEstimator,
}

impl Predictor {
    /// Predictor with the four standard generators.
    pub fn new(
        domain: &Domain,
        config: &EngineConfig,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, InputError> {
        Self::with_generators(domain, config, default_generators(config, random))
    }

    pub fn with_generators(
        domain: &Domain,
        config: &EngineConfig,
        generators: Vec<Box<dyn SignalGenerator>>,
    ) -> Result<Self, InputError> {
        domain.validate()?;
        Ok(Self {
            domain: domain.clone(),
            generators,
            detector: PatternDetector::new(domain, config.patterns.clone()),
            estimator: ConfidenceEstimator::new(config.confidence.clone()),
        })
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn generators(&self) -> &[Box<dyn SignalGenerator>] {
        &self.generators
    }

    /// Run one prediction. History is ordered oldest first.
    ///
    /// Fails only on invalid input. An empty history is valid and yields a
    /// low-confidence prediction built from whatever signals still apply.
    pub fn predict(
        &self,
        history: &[HistoricalDraw],
        weights: &WeightVector,
    ) -> Result<PredictionReport, InputError> {
        self.domain.validate_history(history)?;
        weights.validate()?;

        let start = Instant::now();

        let (strategy_results, patterns) = rayon::join(
            || run_generators(&self.generators, history, &self.domain),
            || self.detector.detect(history),
        );

        let mut prediction = EnsembleCombiner::new(&self.domain).combine(&strategy_results, weights);
        prediction.confidence = self
            .estimator
            .estimate(&strategy_results, &patterns, history.len());

        if let Some(bonus) = self.domain.bonus_pool() {
            prediction.bonus_candidates = self.predict_bonus(&bonus, history, weights);
        }

        debug!(
            patterns = patterns.len(),
            strategies = strategy_results.len(),
            elapsed_us = start.elapsed().as_micros(),
            "prediction stages complete"
        );
        info!(
            domain = %self.domain.id,
            draws = history.len(),
            candidates = ?prediction.candidates,
            confidence = prediction.confidence,
            fallback = prediction.used_equal_weight_fallback(),
            "prediction generated"
        );

        Ok(PredictionReport {
            prediction,
            patterns,
            strategy_results,
        })
    }

    /// Ranks the bonus pool with the same generators and weights.
    fn predict_bonus(
        &self,
        bonus: &Domain,
        history: &[HistoricalDraw],
        weights: &WeightVector,
    ) -> Vec<u32> {
        let bonus_history: Vec<HistoricalDraw> = history
            .iter()
            .map(HistoricalDraw::bonus_view)
            .filter(|d| !d.numbers.is_empty())
            .collect();
        let results = run_generators(&self.generators, &bonus_history, bonus);
        EnsembleCombiner::new(bonus)
            .combine(&results, weights)
            .candidates
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use drawcast_core::{StrategyId, MAX_CONFIDENCE};

    use super::*;
    use crate::signals::FixedSeed;

    fn predictor(domain: &Domain) -> Predictor {
        Predictor::new(domain, &EngineConfig::default(), Arc::new(FixedSeed(11))).unwrap()
    }

    fn history(rows: &[&[u32]]) -> Vec<HistoricalDraw> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, r)| HistoricalDraw::new(start + Duration::days(i as i64), r.iter().copied()))
            .collect()
    }

    #[test]
    fn invalid_domain_is_rejected() {
        let domain = Domain::new("bad", 0, 1, 10);
        assert!(Predictor::new(&domain, &EngineConfig::default(), Arc::new(FixedSeed(0))).is_err());
    }

    #[test]
    fn out_of_range_draw_is_rejected() {
        let domain = Domain::new("d", 2, 1, 10);
        let err = predictor(&domain)
            .predict(&history(&[&[1, 11]]), &WeightVector::default())
            .unwrap_err();
        assert!(matches!(err, InputError::NumberOutOfRange { number: 11, .. }));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let domain = Domain::new("d", 2, 1, 10);
        let weights = WeightVector::from_shares([(StrategyId::Frequency, 1.0)]);
        assert!(predictor(&domain).predict(&[], &weights).is_ok());

        let bad: WeightVector = serde_json::from_str(r#"{"frequency": -1.0}"#).unwrap();
        assert!(matches!(
            predictor(&domain).predict(&[], &bad),
            Err(InputError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn empty_history_still_predicts() {
        let domain = Domain::new("d", 3, 1, 20);
        let report = predictor(&domain).predict(&[], &WeightVector::default()).unwrap();
        assert_eq!(report.prediction.candidates.len(), 3);
        assert_eq!(report.prediction.confidence, 0.0);
        assert!(report.patterns.is_empty());
    }

    #[test]
    fn count_equal_to_range_selects_everything() {
        let domain = Domain::new("d", 4, 1, 4);
        let report = predictor(&domain)
            .predict(&history(&[&[1, 2, 3, 4]]), &WeightVector::default())
            .unwrap();
        assert_eq!(report.prediction.candidates, vec![1, 2, 3, 4]);
    }

    #[test]
    fn bonus_pool_is_predicted_separately() {
        let domain = Domain::new("d", 2, 1, 20).with_bonus(1, 5);
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let draws: Vec<HistoricalDraw> = (0..10)
            .map(|i| HistoricalDraw::new(start + Duration::days(i), [1, 15]).with_bonus([3]))
            .collect();

        let weights = WeightVector::new([(StrategyId::Frequency, 1.0)]).unwrap();
        let report = predictor(&domain).predict(&draws, &weights).unwrap();
        assert_eq!(report.prediction.candidates, vec![1, 15]);
        assert_eq!(report.prediction.bonus_candidates, vec![3]);
    }

    #[test]
    fn confidence_stays_below_cap() {
        let domain = Domain::new("d", 2, 1, 6);
        let row: &[u32] = &[1, 2];
        let rows = vec![row; 2000];
        let report = predictor(&domain)
            .predict(&history(&rows), &WeightVector::default())
            .unwrap();
        assert!(report.prediction.confidence <= MAX_CONFIDENCE);
        assert!(report.prediction.confidence >= 0.0);
    }
}
