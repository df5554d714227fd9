//! Rolling performance history per strategy.
//!
//! Samples and alerts live in FIFO buffers of fixed capacity; the oldest
//! entry is evicted when a push would exceed it. Every sample re-evaluates
//! its strategy's state from the mean accuracy of that strategy's most
//! recent `evaluation_window` samples, and a state change may raise an alert.

mod report;
mod state;

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use drawcast_core::config::TrackerConfig;
use drawcast_core::{Alert, BoundedBuffer, PerformanceSample, StrategyId};

use crate::dispatch::log_alert;
use crate::error::MonitorError;

pub use report::{AggregateMetrics, HealthReport, StrategyHealth, TrackerSnapshot};
pub use state::StrategyState;

#[derive(Debug)]
struct TrackerInner {
    samples: BoundedBuffer<PerformanceSample>,
    alerts: BoundedBuffer<Alert>,
    states: BTreeMap<StrategyId, StrategyState>,
}

impl TrackerInner {
    fn rolling_accuracy(&self, strategy: StrategyId, window: usize) -> Option<f64> {
        let recent: Vec<f64> = self
            .samples
            .iter()
            .rev()
            .filter(|s| s.strategy_id == strategy)
            .take(window)
            .map(|s| s.accuracy)
            .collect();
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    }

    fn push_alert(&mut self, alert: Alert) {
        log_alert(&alert);
        if let Some(evicted) = self.alerts.push(alert) {
            trace!(alert_id = %evicted.id, "alert evicted from buffer");
        }
    }
}

/// Tracks strategy performance. Safe to share across threads.
#[derive(Debug)]
pub struct PerformanceTracker {
    config: TrackerConfig,
    inner: RwLock<TrackerInner>,
}

impl PerformanceTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let inner = TrackerInner {
            samples: BoundedBuffer::new(config.sample_capacity),
            alerts: BoundedBuffer::new(config.alert_capacity),
            states: BTreeMap::new(),
        };
        Self {
            config,
            inner: RwLock::new(inner),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TrackerInner>, MonitorError> {
        self.inner
            .read()
            .map_err(|e| MonitorError::LockPoisoned(format!("tracker read lock: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TrackerInner>, MonitorError> {
        self.inner
            .write()
            .map_err(|e| MonitorError::LockPoisoned(format!("tracker write lock: {e}")))
    }

    /// Record one sample and re-evaluate its strategy.
    ///
    /// Returns the alert raised by a state transition, if any.
    pub fn record_sample(&self, sample: PerformanceSample) -> Result<Option<Alert>, MonitorError> {
        if !sample.has_valid_accuracy() {
            return Err(MonitorError::InvalidSample {
                strategy: sample.strategy_id,
                accuracy: sample.accuracy,
            });
        }

        let strategy = sample.strategy_id;
        let mut inner = self.write()?;
        if let Some(evicted) = inner.samples.push(sample) {
            trace!(
                strategy = %evicted.strategy_id,
                instance = %evicted.domain_instance_id,
                "sample evicted from buffer"
            );
        }

        let accuracy = inner
            .rolling_accuracy(strategy, self.config.evaluation_window)
            .unwrap_or_default();
        let previous = inner.states.get(&strategy).copied().unwrap_or_default();
        let next = StrategyState::classify(accuracy, &self.config);
        if next == previous {
            return Ok(None);
        }

        inner.states.insert(strategy, next);
        debug!(%strategy, ?previous, ?next, accuracy, "strategy state changed");

        let alert = previous.transition_alert(next, strategy, accuracy);
        if let Some(alert) = &alert {
            inner.push_alert(alert.clone());
        }
        Ok(alert)
    }

    /// Record samples in order, collecting the alerts they raise.
    pub fn record_samples(
        &self,
        samples: impl IntoIterator<Item = PerformanceSample>,
    ) -> Result<Vec<Alert>, MonitorError> {
        let mut alerts = Vec::new();
        for sample in samples {
            if let Some(alert) = self.record_sample(sample)? {
                alerts.push(alert);
            }
        }
        Ok(alerts)
    }

    /// Add an alert raised outside the state machine.
    pub fn raise_alert(&self, alert: Alert) -> Result<(), MonitorError> {
        self.write()?.push_alert(alert);
        Ok(())
    }

    pub fn state(&self, strategy: StrategyId) -> Result<StrategyState, MonitorError> {
        Ok(self.read()?.states.get(&strategy).copied().unwrap_or_default())
    }

    /// Mean accuracy over the strategy's evaluation window.
    pub fn rolling_accuracy(&self, strategy: StrategyId) -> Result<Option<f64>, MonitorError> {
        Ok(self
            .read()?
            .rolling_accuracy(strategy, self.config.evaluation_window))
    }

    /// Rolling accuracy of every strategy that has buffered samples.
    pub fn rolling_accuracies(&self) -> Result<BTreeMap<StrategyId, f64>, MonitorError> {
        let inner = self.read()?;
        Ok(StrategyId::ALL
            .into_iter()
            .filter_map(|id| {
                inner
                    .rolling_accuracy(id, self.config.evaluation_window)
                    .map(|acc| (id, acc))
            })
            .collect())
    }

    /// Means over all buffered samples in the last `window_hours`.
    pub fn aggregate(&self, window_hours: f64) -> Result<AggregateMetrics, MonitorError> {
        self.aggregate_at(Utc::now(), window_hours, None)
    }

    /// Like [`aggregate`](Self::aggregate), relative to `now` and optionally
    /// restricted to one strategy.
    pub fn aggregate_at(
        &self,
        now: DateTime<Utc>,
        window_hours: f64,
        strategy: Option<StrategyId>,
    ) -> Result<AggregateMetrics, MonitorError> {
        let start = window_start(now, window_hours);
        let inner = self.read()?;
        Ok(AggregateMetrics::from_samples(inner.samples.iter().filter(|s| {
            s.timestamp >= start && s.timestamp <= now && strategy.map_or(true, |id| s.strategy_id == id)
        })))
    }

    /// Per-strategy means over the last `window_hours`.
    pub fn aggregate_by_strategy(
        &self,
        window_hours: f64,
    ) -> Result<BTreeMap<StrategyId, AggregateMetrics>, MonitorError> {
        let now = Utc::now();
        let mut out = BTreeMap::new();
        for id in StrategyId::ALL {
            let metrics = self.aggregate_at(now, window_hours, Some(id))?;
            if metrics.sample_count > 0 {
                out.insert(id, metrics);
            }
        }
        Ok(out)
    }

    /// Buffered samples newer than `since`, oldest first.
    pub fn samples_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<PerformanceSample>, MonitorError> {
        let inner = self.read()?;
        Ok(inner
            .samples
            .iter()
            .filter(|s| since.map_or(true, |t| s.timestamp > t))
            .cloned()
            .collect())
    }

    pub fn alerts(&self) -> Result<Vec<Alert>, MonitorError> {
        Ok(self.read()?.alerts.snapshot())
    }

    pub fn sample_count(&self) -> Result<usize, MonitorError> {
        Ok(self.read()?.samples.len())
    }

    pub fn health(&self) -> Result<HealthReport, MonitorError> {
        let inner = self.read()?;
        let strategies: Vec<StrategyHealth> = StrategyId::ALL
            .into_iter()
            .map(|id| StrategyHealth {
                strategy_id: id,
                state: inner.states.get(&id).copied().unwrap_or_default(),
                rolling_accuracy: inner.rolling_accuracy(id, self.config.evaluation_window),
                buffered_samples: inner.samples.iter().filter(|s| s.strategy_id == id).count(),
            })
            .collect();
        let worst_state = strategies.iter().map(|s| s.state).max().unwrap_or_default();

        Ok(HealthReport {
            generated_at: Utc::now(),
            strategies,
            worst_state,
            healthy: worst_state != StrategyState::Critical,
        })
    }

    pub fn snapshot(&self) -> Result<TrackerSnapshot, MonitorError> {
        let inner = self.read()?;
        Ok(TrackerSnapshot {
            samples: inner.samples.snapshot(),
            alerts: inner.alerts.snapshot(),
            states: inner.states.clone(),
        })
    }
}

/// Oldest timestamp inside the window. NaN counts as an empty window and an
/// unbounded window reaches back to the earliest representable time.
fn window_start(now: DateTime<Utc>, window_hours: f64) -> DateTime<Utc> {
    let hours = if window_hours.is_nan() { 0.0 } else { window_hours.max(0.0) };
    let millis = (hours * 3_600_000.0) as i64;
    Duration::try_milliseconds(millis)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests;
