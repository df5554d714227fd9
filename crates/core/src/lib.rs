//! Value objects, validation, configuration, and collaborator contracts
//! shared by the drawcast crates.

pub mod alert;
pub mod buffer;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod draw;
pub mod error;
pub mod pattern;
pub mod performance;
pub mod prediction;
pub mod score;
pub mod strategy;

pub use alert::{Alert, AlertSeverity};
pub use buffer::BoundedBuffer;
pub use collaborators::{AlertSink, HistoryProvider, OutcomeProvider, PredictionSink};
pub use config::{EngineConfig, EngineConfigDocument};
pub use domain::Domain;
pub use draw::{DrawId, HistoricalDraw};
pub use error::{InputError, ProviderError};
pub use pattern::{DetectedPattern, PatternType};
pub use performance::PerformanceSample;
pub use prediction::{CombinedPrediction, EQUAL_WEIGHT_FALLBACK};
pub use score::{rank_descending, SignalScoreMap};
pub use strategy::{StrategyId, StrategyResult, WeightVector};

/// Upper bound on any confidence the system reports. It never claims certainty.
pub const MAX_CONFIDENCE: f64 = 0.99;
