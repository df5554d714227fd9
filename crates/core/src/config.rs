//! Engine configuration: domains, signal parameters, pattern thresholds,
//! confidence calibration, tracker bands and the reweighting schedule.
//!
//! Configuration is injected: this module parses YAML text handed to it by
//! the host and never reads the environment or the filesystem itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::InputError;
use crate::strategy::WeightVector;

/// Expected `kind` of a configuration document.
pub const CONFIG_KIND: &str = "EngineConfig";

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfigDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ConfigMetadata,
    pub spec: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl EngineConfigDocument {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, InputError> {
        serde_yaml::from_str(yaml).map_err(|e| InputError::InvalidConfig(e.to_string()))
    }

    /// Check the document kind and every threshold, yielding the usable config.
    pub fn compile(&self) -> Result<EngineConfig, InputError> {
        if self.kind != CONFIG_KIND {
            return Err(InputError::InvalidConfig(format!(
                "expected kind '{}', found '{}'",
                CONFIG_KIND, self.kind
            )));
        }
        self.spec.validate()?;
        Ok(self.spec.clone())
    }
}

// ── Compiled types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub reweighting: ReweightConfig,
    /// Starting weight per strategy; all strategies equal when omitted.
    #[serde(default)]
    pub initial_weights: WeightVector,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        for domain in &self.domains {
            domain.validate()?;
        }
        self.initial_weights.validate()?;
        self.signals.validate()?;
        self.patterns.validate()?;
        self.confidence.validate()?;
        self.tracker.validate()?;
        self.reweighting.validate()
    }

    /// Look up a configured domain by id.
    pub fn domain(&self, id: &str) -> Result<&Domain, InputError> {
        self.domains
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| InputError::UnknownDomain(id.to_string()))
    }
}

fn invalid(msg: impl Into<String>) -> InputError {
    InputError::InvalidConfig(msg.into())
}

fn require_unit(name: &str, v: f64) -> Result<(), InputError> {
    if !(0.0..=1.0).contains(&v) {
        return Err(invalid(format!("{} must be within [0, 1], got {}", name, v)));
    }
    Ok(())
}

/// Parameters of the history-driven signal generators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SignalConfig {
    /// Number of most recent draws the recency signal looks at.
    #[serde(default = "default_recency_window")]
    pub recency_window: usize,
    /// Score for candidates absent from the recency window.
    #[serde(default = "default_recency_floor")]
    pub recency_floor: f64,
}

fn default_recency_window() -> usize { 20 }
fn default_recency_floor() -> f64 { 0.1 }

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            recency_window: default_recency_window(),
            recency_floor: default_recency_floor(),
        }
    }
}

impl SignalConfig {
    fn validate(&self) -> Result<(), InputError> {
        if self.recency_window == 0 {
            return Err(invalid("signals.recency_window must be positive"));
        }
        require_unit("signals.recency_floor", self.recency_floor)
    }
}

/// Thresholds of the structural pattern detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    /// Shortest consecutive run reported as SEQUENTIAL.
    #[serde(default = "default_min_run_length")]
    pub min_run_length: usize,
    /// Fraction of draws the modal sum must exceed.
    #[serde(default = "default_sum_mode_fraction")]
    pub sum_mode_fraction: f64,
    /// Minimum occurrences of the modal sum.
    #[serde(default = "default_min_sum_repeats")]
    pub min_sum_repeats: usize,
    /// Confidence floor for PARITY and RANGE_SPLIT.
    #[serde(default = "default_balance_floor")]
    pub balance_confidence_floor: f64,
    /// First lag examined by cycle detection (inclusive).
    #[serde(default = "default_min_lag")]
    pub min_lag: usize,
    /// Lag bound of cycle detection (exclusive, also capped at half the series).
    #[serde(default = "default_max_lag")]
    pub max_lag: usize,
    /// Autocorrelation a lag must exceed to be reported as CYCLE.
    #[serde(default = "default_autocorrelation_threshold")]
    pub autocorrelation_threshold: f64,
}

fn default_min_run_length() -> usize { 3 }
fn default_sum_mode_fraction() -> f64 { 0.10 }
fn default_min_sum_repeats() -> usize { 2 }
fn default_balance_floor() -> f64 { 0.6 }
fn default_min_lag() -> usize { 3 }
fn default_max_lag() -> usize { 20 }
fn default_autocorrelation_threshold() -> f64 { 0.5 }

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_run_length: default_min_run_length(),
            sum_mode_fraction: default_sum_mode_fraction(),
            min_sum_repeats: default_min_sum_repeats(),
            balance_confidence_floor: default_balance_floor(),
            min_lag: default_min_lag(),
            max_lag: default_max_lag(),
            autocorrelation_threshold: default_autocorrelation_threshold(),
        }
    }
}

impl PatternConfig {
    fn validate(&self) -> Result<(), InputError> {
        if self.min_run_length < 2 {
            return Err(invalid("patterns.min_run_length must be at least 2"));
        }
        if self.min_lag == 0 || self.min_lag >= self.max_lag {
            return Err(invalid(format!(
                "patterns lag range [{}, {}) is empty",
                self.min_lag, self.max_lag
            )));
        }
        require_unit("patterns.sum_mode_fraction", self.sum_mode_fraction)?;
        require_unit("patterns.balance_confidence_floor", self.balance_confidence_floor)?;
        require_unit("patterns.autocorrelation_threshold", self.autocorrelation_threshold)
    }
}

/// Calibration of the combined confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfidenceConfig {
    /// History size at which data volume stops limiting confidence.
    #[serde(default = "default_volume_target")]
    pub volume_target: usize,
    /// Patterns above this confidence boost the estimate.
    #[serde(default = "default_strong_pattern")]
    pub strong_pattern_threshold: f64,
    /// Boost per strong pattern.
    #[serde(default = "default_boost_step")]
    pub pattern_boost_step: f64,
}

fn default_volume_target() -> usize { 1000 }
fn default_strong_pattern() -> f64 { 0.7 }
fn default_boost_step() -> f64 { 0.1 }

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            volume_target: default_volume_target(),
            strong_pattern_threshold: default_strong_pattern(),
            pattern_boost_step: default_boost_step(),
        }
    }
}

impl ConfidenceConfig {
    fn validate(&self) -> Result<(), InputError> {
        if self.volume_target == 0 {
            return Err(invalid("confidence.volume_target must be positive"));
        }
        require_unit("confidence.strong_pattern_threshold", self.strong_pattern_threshold)?;
        if !self.pattern_boost_step.is_finite() || self.pattern_boost_step < 0.0 {
            return Err(invalid("confidence.pattern_boost_step must be non-negative"));
        }
        Ok(())
    }
}

/// Rolling-window sizes and accuracy bands of the performance tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: usize,
    #[serde(default = "default_alert_capacity")]
    pub alert_capacity: usize,
    /// Most recent samples per strategy that decide its state.
    #[serde(default = "default_evaluation_window")]
    pub evaluation_window: usize,
    /// Aggregate accuracy at or above this is ACTIVE.
    #[serde(default = "default_active_threshold")]
    pub active_threshold: f64,
    /// Aggregate accuracy below this is CRITICAL.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

fn default_sample_capacity() -> usize { 1000 }
fn default_alert_capacity() -> usize { 500 }
fn default_evaluation_window() -> usize { 10 }
fn default_active_threshold() -> f64 { 0.6 }
fn default_critical_threshold() -> f64 { 0.4 }

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sample_capacity: default_sample_capacity(),
            alert_capacity: default_alert_capacity(),
            evaluation_window: default_evaluation_window(),
            active_threshold: default_active_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

impl TrackerConfig {
    fn validate(&self) -> Result<(), InputError> {
        if self.sample_capacity == 0 || self.alert_capacity == 0 || self.evaluation_window == 0 {
            return Err(invalid("tracker capacities and evaluation_window must be positive"));
        }
        require_unit("tracker.active_threshold", self.active_threshold)?;
        require_unit("tracker.critical_threshold", self.critical_threshold)?;
        if self.critical_threshold > self.active_threshold {
            return Err(invalid(format!(
                "tracker.critical_threshold {} exceeds active_threshold {}",
                self.critical_threshold, self.active_threshold
            )));
        }
        Ok(())
    }
}

/// Schedule and tuning of the periodic reweighting loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReweightConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Blend factor between the current shares and the accuracy-proportional target.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Lowest share a strategy is reduced to.
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
    /// Expected weighted accuracy a new vector must keep.
    #[serde(default = "default_accuracy_floor")]
    pub accuracy_floor: f64,
    /// How long shutdown waits for an in-flight cycle.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    /// Draws replayed when outcomes are derived by backtesting.
    #[serde(default = "default_backtest_depth")]
    pub backtest_depth: usize,
}

fn default_interval() -> u64 { 3600 }
fn default_learning_rate() -> f64 { 0.5 }
fn default_min_weight() -> f64 { 0.01 }
fn default_accuracy_floor() -> f64 { 0.2 }
fn default_shutdown_grace() -> u64 { 30 }
fn default_backtest_depth() -> usize { 20 }

impl Default for ReweightConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            learning_rate: default_learning_rate(),
            min_weight: default_min_weight(),
            accuracy_floor: default_accuracy_floor(),
            shutdown_grace_seconds: default_shutdown_grace(),
            backtest_depth: default_backtest_depth(),
        }
    }
}

impl ReweightConfig {
    fn validate(&self) -> Result<(), InputError> {
        if self.interval_seconds == 0 {
            return Err(invalid("reweighting.interval_seconds must be positive"));
        }
        require_unit("reweighting.learning_rate", self.learning_rate)?;
        require_unit("reweighting.min_weight", self.min_weight)?;
        require_unit("reweighting.accuracy_floor", self.accuracy_floor)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}
