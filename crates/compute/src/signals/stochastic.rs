use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use drawcast_core::{Domain, HistoricalDraw, SignalScoreMap, StrategyId};

use super::SignalGenerator;

/// Where the stochastic signal gets its seed for each invocation.
pub trait RandomSource: Send + Sync {
    fn next_seed(&self) -> u64;
}

/// Fresh OS-seeded entropy on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropySource;

impl RandomSource for EntropySource {
    fn next_seed(&self) -> u64 {
        rand::random()
    }
}

/// The same seed on every call, for reproducible runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSeed(pub u64);

impl RandomSource for FixedSeed {
    fn next_seed(&self) -> u64 {
        self.0
    }
}

/// Independent uniform scores in [0, 1), ignoring history.
///
/// Keeps the ensemble from collapsing onto the same few candidates.
#[derive(Clone)]
pub struct StochasticSignal {
    source: Arc<dyn RandomSource>,
}

impl StochasticSignal {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Arc::new(FixedSeed(seed)))
    }
}

impl Default for StochasticSignal {
    fn default() -> Self {
        Self::new(Arc::new(EntropySource))
    }
}

impl fmt::Debug for StochasticSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StochasticSignal").finish_non_exhaustive()
    }
}

impl SignalGenerator for StochasticSignal {
    fn strategy_id(&self) -> StrategyId {
        StrategyId::Stochastic
    }

    fn generate(&self, _history: &[HistoricalDraw], domain: &Domain) -> SignalScoreMap {
        let mut rng = StdRng::seed_from_u64(self.source.next_seed());
        SignalScoreMap::from_scores(domain.candidates().map(|c| (c, rng.gen::<f64>())))
    }
}
