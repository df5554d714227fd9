//! Outcome provider that scores strategies by replaying recent draws.
//!
//! For each of the last `depth` draws, every generator predicts from the
//! draws before it and the prediction is scored against what was drawn.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::debug;

use drawcast_core::{
    Domain, HistoricalDraw, HistoryProvider, OutcomeProvider, PerformanceSample, ProviderError,
    StrategyResult,
};

use crate::signals::SignalGenerator;

/// Draws requested from the history provider per replay.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

pub struct BacktestOutcomes {
    history: Arc<dyn HistoryProvider>,
    replayer: Arc<Replayer>,
    history_limit: usize,
}

/// The CPU-bound half of a backtest, shared with blocking replay tasks.
struct Replayer {
    domain: Domain,
    generators: Vec<Box<dyn SignalGenerator>>,
    depth: usize,
}

impl BacktestOutcomes {
    pub fn new(
        history: Arc<dyn HistoryProvider>,
        domain: &Domain,
        generators: Vec<Box<dyn SignalGenerator>>,
        depth: usize,
    ) -> Self {
        Self {
            history,
            replayer: Arc::new(Replayer {
                domain: domain.clone(),
                generators,
                depth,
            }),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Score every generator on the replayable draws newer than `since`.
    ///
    /// A draw is replayable when at least one draw precedes it. Runs on the
    /// calling thread; `get_outcomes` moves it to the blocking pool.
    pub fn replay(
        &self,
        history: &[HistoricalDraw],
        since: Option<DateTime<Utc>>,
    ) -> Vec<PerformanceSample> {
        self.replayer.replay(history, since)
    }
}

impl Replayer {
    fn replay(&self, history: &[HistoricalDraw], since: Option<DateTime<Utc>>) -> Vec<PerformanceSample> {
        let first = history.len().saturating_sub(self.depth).max(1);
        if first >= history.len() {
            return Vec::new();
        }

        (first..history.len())
            .into_par_iter()
            .filter(|&i| since.map_or(true, |s| history[i].timestamp > s))
            .flat_map_iter(|i| self.score_draw(&history[..i], &history[i]))
            .collect()
    }

    fn score_draw(&self, prior: &[HistoricalDraw], actual: &HistoricalDraw) -> Vec<PerformanceSample> {
        let instance = format!("{}:{}", self.domain.id, actual.id);
        self.generators
            .iter()
            .map(|g| {
                let result =
                    StrategyResult::from_scores(g.strategy_id(), g.generate(prior, &self.domain), &self.domain);
                PerformanceSample::from_outcome(
                    result.strategy_id,
                    instance.clone(),
                    self.domain.count,
                    &result.ranked_candidates,
                    &actual.numbers,
                    actual.timestamp,
                )
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl OutcomeProvider for BacktestOutcomes {
    async fn get_outcomes(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PerformanceSample>, ProviderError> {
        let domain_id = self.replayer.domain.id.clone();
        let history = self.history.get_history(&domain_id, self.history_limit).await?;
        self.replayer.domain.validate_history(&history)?;
        let draws = history.len();

        // Replay off the runtime so timers and shutdown keep firing.
        let replayer = Arc::clone(&self.replayer);
        let samples = tokio::task::spawn_blocking(move || replayer.replay(&history, since))
            .await
            .map_err(|e| ProviderError::Outcomes(format!("backtest replay task failed: {e}")))?;

        debug!(
            domain = %domain_id,
            draws,
            samples = samples.len(),
            "backtest replay complete"
        );
        Ok(samples)
    }
}
