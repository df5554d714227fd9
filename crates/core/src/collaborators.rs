//! Contracts for the external collaborators around the core.
//!
//! The core only consumes these; history ingestion, outcome scoring,
//! persistence and notification delivery live in the host process.

use chrono::{DateTime, Utc};

use crate::alert::Alert;
use crate::draw::HistoricalDraw;
use crate::error::ProviderError;
use crate::performance::PerformanceSample;
use crate::prediction::CombinedPrediction;

/// Source of recorded draws.
#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Up to `limit` most recent draws of a domain, ordered oldest to newest.
    async fn get_history(
        &self,
        domain_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoricalDraw>, ProviderError>;
}

/// Source of post-hoc strategy performance.
#[async_trait::async_trait]
pub trait OutcomeProvider: Send + Sync {
    /// Samples recorded after `since` (all available when `None`).
    async fn get_outcomes(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PerformanceSample>, ProviderError>;
}

/// Fire-and-forget storage for predictions. Failures are the sink's concern.
#[async_trait::async_trait]
pub trait PredictionSink: Send + Sync {
    async fn store(&self, prediction: &CombinedPrediction) -> Result<(), ProviderError>;

    fn sink_name(&self) -> &str;
}

/// Receives alerts for persistence or notification delivery.
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn store(&self, alert: &Alert) -> Result<(), ProviderError>;

    fn sink_name(&self) -> &str;
}
