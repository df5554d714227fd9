//! Structural pattern detection over a draw history.
//!
//! Every detector is a pure function of `(history, domain, config)`. The
//! detector runs them in a fixed order (sequential, sum, parity, range
//! split, cycle) so repeated calls produce identical output.

mod balance;
mod cycle;
mod sequential;
mod sum;

use tracing::debug;

use drawcast_core::config::PatternConfig;
use drawcast_core::{DetectedPattern, Domain, HistoricalDraw};

pub use cycle::{autocorrelation, best_lag};
pub use sequential::longest_run;

/// Finds structural regularities in a history.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    domain: Domain,
    config: PatternConfig,
}

impl PatternDetector {
    pub fn new(domain: &Domain, config: PatternConfig) -> Self {
        Self {
            domain: domain.clone(),
            config,
        }
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Run all detectors. An empty history yields no patterns.
    pub fn detect(&self, history: &[HistoricalDraw]) -> Vec<DetectedPattern> {
        if history.is_empty() {
            return Vec::new();
        }

        let patterns: Vec<DetectedPattern> = [
            sequential::detect(history, &self.domain, &self.config),
            sum::detect(history, &self.config),
            balance::detect_parity(history, &self.domain, &self.config),
            balance::detect_range_split(history, &self.domain, &self.config),
            cycle::detect(history, &self.config),
        ]
        .into_iter()
        .flatten()
        .collect();

        debug!(
            domain = %self.domain.id,
            draws = history.len(),
            patterns = patterns.len(),
            "pattern detection complete"
        );
        patterns
    }
}
