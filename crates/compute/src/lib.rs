//! Candidate scoring, pattern detection, and ensemble prediction.

pub mod patterns;
pub mod pipeline;
pub mod signals;

pub use patterns::PatternDetector;
pub use pipeline::backtest::BacktestOutcomes;
pub use pipeline::confidence::{pairwise_agreement, ConfidenceEstimator};
pub use pipeline::ensemble::EnsembleCombiner;
pub use pipeline::{PredictionReport, Predictor};
pub use signals::{
    default_generators, run_generators, EntropySource, FixedSeed, FrequencySignal, RandomSource,
    RecencySignal, SignalGenerator, StochasticSignal, StructuralPatternSignal,
};
