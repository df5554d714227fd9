//! Periodic reweighting of strategies from observed performance.
//!
//! Each cycle:
//!
//! 1. pulls samples newer than the last one seen from the outcome provider
//! 2. drops samples with out-of-range accuracy behind a WARNING alert,
//!    records the rest in the tracker and computes each strategy's
//!    improvement since the previous cycle
//! 3. proposes new weights from the tracker's rolling accuracies
//! 4. validates the proposal and swaps it in whole, or rejects it
//!
//! A failing or panicking cycle raises an ERROR alert and the loop carries on
//! at the next tick with the previous weights in force.

pub mod adjust;
pub mod metrics;

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use drawcast_core::config::ReweightConfig;
use drawcast_core::{Alert, OutcomeProvider, PerformanceSample, StrategyId, WeightVector};

use crate::dispatch::AlertDispatcher;
use crate::error::MonitorError;
use crate::tracker::PerformanceTracker;
use crate::weights::SharedWeights;

use self::metrics::LoopMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    Applied,
    Rejected,
    NoNewSamples,
}

/// What one completed cycle did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
    pub samples_ingested: usize,
    pub prior_weights: WeightVector,
    /// Weights in force after the cycle.
    pub weights: WeightVector,
    pub prior_expected_accuracy: f64,
    pub expected_accuracy: f64,
    /// Change in mean accuracy per strategy since the previous cycle.
    pub improvement: BTreeMap<StrategyId, f64>,
    pub alerts: Vec<Alert>,
}

impl CycleReport {
    fn unchanged(started_at: DateTime<Utc>, prior: WeightVector, alerts: Vec<Alert>) -> Self {
        Self {
            started_at,
            outcome: CycleOutcome::NoNewSamples,
            samples_ingested: 0,
            weights: prior.clone(),
            prior_weights: prior,
            prior_expected_accuracy: 0.0,
            expected_accuracy: 0.0,
            improvement: BTreeMap::new(),
            alerts,
        }
    }
}

pub struct ReweightingLoop {
    config: ReweightConfig,
    tracker: Arc<PerformanceTracker>,
    weights: SharedWeights,
    outcomes: Arc<dyn OutcomeProvider>,
    dispatcher: AlertDispatcher,
    metrics: Arc<RwLock<LoopMetrics>>,
    /// Newest sample timestamp seen so far.
    watermark: Option<DateTime<Utc>>,
    last_accuracy: BTreeMap<StrategyId, f64>,
}

impl ReweightingLoop {
    pub fn new(
        config: ReweightConfig,
        tracker: Arc<PerformanceTracker>,
        weights: SharedWeights,
        outcomes: Arc<dyn OutcomeProvider>,
    ) -> Self {
        Self {
            config,
            tracker,
            weights,
            outcomes,
            dispatcher: AlertDispatcher::empty(),
            metrics: Arc::new(RwLock::new(LoopMetrics::default())),
            watermark: None,
            last_accuracy: BTreeMap::new(),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: AlertDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Handle to the loop's counters, valid after the loop is spawned.
    pub fn metrics(&self) -> Arc<RwLock<LoopMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Run one cycle. Errors leave the installed weights untouched.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, MonitorError> {
        let started_at = Utc::now();
        let samples = self.outcomes.get_outcomes(self.watermark).await?;
        let prior = self.weights.snapshot()?;

        if samples.is_empty() {
            debug!("no new samples, weights unchanged");
            return Ok(CycleReport::unchanged(started_at, prior, Vec::new()));
        }

        let newest = samples.iter().map(|s| s.timestamp).max();
        let (valid, invalid): (Vec<_>, Vec<_>) =
            samples.into_iter().partition(PerformanceSample::has_valid_accuracy);

        let mut alerts = Vec::new();
        if !invalid.is_empty() {
            let alert = invalid_samples_alert(&invalid);
            self.tracker.raise_alert(alert.clone())?;
            alerts.push(alert);
        }

        if valid.is_empty() {
            self.watermark = newest.max(self.watermark);
            for alert in &alerts {
                self.dispatcher.dispatch(alert).await;
            }
            return Ok(CycleReport::unchanged(started_at, prior, alerts));
        }

        let samples_ingested = valid.len();
        let batch_means = batch_means(&valid);
        alerts.extend(self.tracker.record_samples(valid)?);
        self.watermark = newest.max(self.watermark);
        let improvement = self.track_improvement(batch_means);

        let accuracies = self.tracker.rolling_accuracies()?;
        let proposed = adjust::propose(&prior, &accuracies, &self.config);
        let prior_expected = adjust::expected_accuracy(&prior, &accuracies);
        let expected = adjust::expected_accuracy(&proposed, &accuracies);

        let (outcome, weights) =
            match adjust::validate(prior_expected, expected, self.config.accuracy_floor) {
                Ok(()) => {
                    self.weights.replace(proposed.clone())?;
                    info!(
                        weights = ?proposed,
                        prior_expected,
                        expected,
                        "strategy weights updated"
                    );
                    (CycleOutcome::Applied, proposed)
                }
                Err(rejection) => {
                    let alert = Alert::info(None, rejection.to_string());
                    self.tracker.raise_alert(alert.clone())?;
                    alerts.push(alert);
                    (CycleOutcome::Rejected, prior.clone())
                }
            };

        for alert in &alerts {
            self.dispatcher.dispatch(alert).await;
        }

        Ok(CycleReport {
            started_at,
            outcome,
            samples_ingested,
            prior_weights: prior,
            weights,
            prior_expected_accuracy: prior_expected,
            expected_accuracy: expected,
            improvement,
            alerts,
        })
    }

    /// Compare this batch's mean accuracy per strategy with the last batch's.
    fn track_improvement(&mut self, means: BTreeMap<StrategyId, f64>) -> BTreeMap<StrategyId, f64> {
        let mut improvement = BTreeMap::new();
        for (id, mean) in means {
            if let Some(prev) = self.last_accuracy.insert(id, mean) {
                improvement.insert(id, mean - prev);
            }
        }
        improvement
    }

    /// Run one cycle, turning errors and panics into an ERROR alert.
    pub async fn run_guarded(&mut self) -> Option<CycleReport> {
        let start = Instant::now();
        let result = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(MonitorError::Panicked(panic_message(payload.as_ref()))),
        };
        let elapsed = start.elapsed();

        match result {
            Ok(report) => {
                if let Ok(mut m) = self.metrics.write() {
                    m.record_cycle(report.outcome, elapsed);
                }
                Some(report)
            }
            Err(e) => {
                if let Ok(mut m) = self.metrics.write() {
                    m.record_failure(&e.to_string(), elapsed);
                }
                let alert = Alert::error(None, format!("reweighting cycle failed: {e}"));
                if let Err(te) = self.tracker.raise_alert(alert.clone()) {
                    warn!(error = %te, "could not record cycle failure alert");
                }
                self.dispatcher.dispatch(&alert).await;
                None
            }
        }
    }

    /// Run cycles on the configured interval until `shutdown` turns true or
    /// its sender is dropped.
    ///
    /// A cycle in flight at shutdown gets `shutdown_grace` to finish and is
    /// abandoned after that. Weight swaps are atomic, so an abandoned cycle
    /// leaves the previous vector in place.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval().max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let grace = self.config.shutdown_grace();

        info!(
            interval_secs = self.config.interval_seconds,
            grace_secs = grace.as_secs(),
            "reweighting loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }

            let cycle = self.run_guarded();
            tokio::pin!(cycle);
            let stop = tokio::select! {
                _ = &mut cycle => false,
                _ = shutdown_requested(&mut shutdown) => {
                    info!("shutdown requested, waiting for in-flight cycle");
                    if tokio::time::timeout(grace, &mut cycle).await.is_err() {
                        warn!(grace_secs = grace.as_secs(), "in-flight cycle abandoned");
                    }
                    true
                }
            };
            if stop {
                break;
            }
        }

        info!("reweighting loop stopped");
    }

    /// Start the loop on the tokio runtime.
    pub fn spawn(self) -> LoopHandle {
        let (tx, rx) = watch::channel(false);
        let metrics = self.metrics();
        let task = tokio::spawn(self.run(rx));
        LoopHandle {
            shutdown: tx,
            task,
            metrics,
        }
    }
}

fn batch_means(samples: &[PerformanceSample]) -> BTreeMap<StrategyId, f64> {
    let mut sums: BTreeMap<StrategyId, (f64, usize)> = BTreeMap::new();
    for s in samples {
        let entry = sums.entry(s.strategy_id).or_default();
        entry.0 += s.accuracy;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(id, (sum, n))| (id, sum / n as f64))
        .collect()
}

fn invalid_samples_alert(invalid: &[PerformanceSample]) -> Alert {
    let subject = invalid[0].strategy_id;
    let single_strategy = invalid.iter().all(|s| s.strategy_id == subject);
    warn!(dropped = invalid.len(), "dropping samples with accuracy outside [0, 1]");
    Alert::warning(
        single_strategy.then_some(subject),
        format!(
            "dropped {} sample(s) with accuracy outside [0, 1], first from {} on {}",
            invalid.len(),
            subject,
            invalid[0].domain_instance_id
        ),
    )
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Owner's handle on a spawned loop.
pub struct LoopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    metrics: Arc<RwLock<LoopMetrics>>,
}

impl LoopHandle {
    pub fn metrics(&self) -> Result<LoopMetrics, MonitorError> {
        self.metrics
            .read()
            .map(|m| m.clone())
            .map_err(|e| MonitorError::LockPoisoned(format!("loop metrics read lock: {e}")))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and wait for the loop to exit.
    pub async fn shutdown(self) -> Result<(), MonitorError> {
        // The loop may already have exited and dropped its receiver.
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| MonitorError::Panicked(format!("reweighting task: {e}")))
    }
}
