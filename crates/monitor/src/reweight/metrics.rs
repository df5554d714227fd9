use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::CycleOutcome;

/// Counters of the reweighting loop, readable by the host at any time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoopMetrics {
    pub cycles_applied: u64,
    pub cycles_rejected: u64,
    /// Cycles that found no new samples.
    pub cycles_idle: u64,
    pub cycles_failed: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_duration: Duration,
    /// Running mean over every cycle, failed ones included.
    pub avg_duration: Duration,
    pub last_error: Option<String>,
}

impl LoopMetrics {
    pub fn cycles_total(&self) -> u64 {
        self.cycles_applied + self.cycles_rejected + self.cycles_idle + self.cycles_failed
    }

    pub fn record_cycle(&mut self, outcome: CycleOutcome, duration: Duration) {
        match outcome {
            CycleOutcome::Applied => self.cycles_applied += 1,
            CycleOutcome::Rejected => self.cycles_rejected += 1,
            CycleOutcome::NoNewSamples => self.cycles_idle += 1,
        }
        self.record_duration(duration);
    }

    pub fn record_failure(&mut self, error: &str, duration: Duration) {
        self.cycles_failed += 1;
        self.last_error = Some(error.to_string());
        self.record_duration(duration);
    }

    fn record_duration(&mut self, duration: Duration) {
        self.last_cycle_at = Some(Utc::now());
        self.last_duration = duration;

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let count = self.cycles_total();
        self.avg_duration = if count <= 1 {
            duration
        } else {
            let prev = self.avg_duration.as_nanos() as f64;
            let cur = duration.as_nanos() as f64;
            Duration::from_nanos((prev + (cur - prev) / count as f64) as u64)
        };
    }
}
