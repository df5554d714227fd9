use drawcast_core::{InputError, ProviderError, StrategyId};

/// Errors raised by the tracker and the reweighting loop.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("invalid sample for {strategy}: accuracy {accuracy}")]
    InvalidSample { strategy: StrategyId, accuracy: f64 },

    #[error("weight update rejected: expected accuracy {proposed:.3} (prior {prior:.3}, floor {floor:.3})")]
    Rejected { proposed: f64, prior: f64, floor: f64 },

    #[error("reweighting cycle panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Input(#[from] InputError),
}
