//! Signal generators: each maps a draw history to a score per candidate.
//!
//! - [`frequency`]: appearance counts scaled by the most frequent candidate
//! - [`recency`]: how recently a candidate last appeared
//! - [`structural`]: support from detected structural patterns
//! - [`stochastic`]: uniform noise from an injectable random source
//!
//! Generators hold only immutable configuration, so any number of them can
//! run concurrently over the same history.

pub mod frequency;
pub mod recency;
pub mod stochastic;
pub mod structural;

use std::sync::Arc;

use rayon::prelude::*;

use drawcast_core::config::EngineConfig;
use drawcast_core::{Domain, HistoricalDraw, SignalScoreMap, StrategyId, StrategyResult};

pub use frequency::FrequencySignal;
pub use recency::RecencySignal;
pub use stochastic::{EntropySource, FixedSeed, RandomSource, StochasticSignal};
pub use structural::{score_from_patterns, StructuralPatternSignal};

/// A pure function of `(history, domain, own config)` producing candidate scores.
///
/// Implementations must not keep mutable state between calls.
pub trait SignalGenerator: Send + Sync {
    /// Strategy this generator reports as.
    fn strategy_id(&self) -> StrategyId;

    /// Score every candidate of `domain`. Returned scores are non-negative.
    fn generate(&self, history: &[HistoricalDraw], domain: &Domain) -> SignalScoreMap;
}

/// The four standard generators, configured from `config`.
pub fn default_generators(
    config: &EngineConfig,
    random: Arc<dyn RandomSource>,
) -> Vec<Box<dyn SignalGenerator>> {
    vec![
        Box::new(FrequencySignal),
        Box::new(RecencySignal::new(
            config.signals.recency_window,
            config.signals.recency_floor,
        )),
        Box::new(StructuralPatternSignal::new(config.patterns.clone())),
        Box::new(StochasticSignal::new(random)),
    ]
}

/// Run every generator in parallel and rank each score map.
///
/// Output order follows `generators`, independent of scheduling.
pub fn run_generators(
    generators: &[Box<dyn SignalGenerator>],
    history: &[HistoricalDraw],
    domain: &Domain,
) -> Vec<StrategyResult> {
    generators
        .par_iter()
        .map(|g| StrategyResult::from_scores(g.strategy_id(), g.generate(history, domain), domain))
        .collect()
}
