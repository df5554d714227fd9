//! Strategy performance tracking and adaptive reweighting.
//!
//! - [`tracker`]: bounded sample/alert history and the per-strategy state machine
//! - [`reweight`]: the periodic loop that turns outcomes into new weights
//! - [`dispatch`]: fan-out of alerts to external sinks
//! - [`weights`]: the weight vector shared between the loop and predictors

pub mod dispatch;
pub mod error;
pub mod reweight;
pub mod tracker;
pub mod weights;

pub use dispatch::{log_alert, AlertDispatcher, DispatchResult, MemoryAlertSink};
pub use error::MonitorError;
pub use reweight::metrics::LoopMetrics;
pub use reweight::{CycleOutcome, CycleReport, LoopHandle, ReweightingLoop};
pub use tracker::{
    AggregateMetrics, HealthReport, PerformanceTracker, StrategyHealth, StrategyState,
    TrackerSnapshot,
};
pub use weights::SharedWeights;
