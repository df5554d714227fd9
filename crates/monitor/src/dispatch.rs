//! Delivers alerts to external sinks.
//!
//! Each alert goes to every registered sink. A failing sink is logged and
//! does not stop delivery to the others.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use drawcast_core::{Alert, AlertSeverity, AlertSink, ProviderError};

/// Outcome of delivering one alert to one sink.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub sink: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Clone, Default)]
pub struct AlertDispatcher {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl AlertDispatcher {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Arc<dyn AlertSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub async fn dispatch(&self, alert: &Alert) -> Vec<DispatchResult> {
        if self.sinks.is_empty() {
            debug!(alert_id = %alert.id, "no alert sinks configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let start = Instant::now();
            let result = sink.store(alert).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let error = match result {
                Ok(()) => {
                    debug!(sink = sink.sink_name(), duration_ms, "alert delivered");
                    None
                }
                Err(e) => {
                    warn!(
                        sink = sink.sink_name(),
                        alert_id = %alert.id,
                        error = %e,
                        duration_ms,
                        "alert delivery failed"
                    );
                    Some(e.to_string())
                }
            };

            results.push(DispatchResult {
                sink: sink.sink_name().to_string(),
                success: error.is_none(),
                error,
                duration_ms,
            });
        }
        results
    }
}

/// Emit an alert through `tracing` at the level matching its severity.
pub fn log_alert(alert: &Alert) {
    let strategy = alert.subject_strategy_id.map(|s| s.as_str()).unwrap_or("-");
    match alert.severity {
        AlertSeverity::Info => info!(alert_id = %alert.id, strategy, "{}", alert.message),
        AlertSeverity::Warning => warn!(alert_id = %alert.id, strategy, "{}", alert.message),
        AlertSeverity::Error => error!(alert_id = %alert.id, strategy, "{}", alert.message),
    }
}

/// Sink that keeps alerts in memory, for hosts that poll instead of push.
#[derive(Debug, Default)]
pub struct MemoryAlertSink {
    alerts: Mutex<Vec<Alert>>,
}

impl MemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl AlertSink for MemoryAlertSink {
    async fn store(&self, alert: &Alert) -> Result<(), ProviderError> {
        let mut alerts = self.alerts.lock().map_err(|e| ProviderError::Sink {
            sink: self.sink_name().to_string(),
            reason: e.to_string(),
        })?;
        alerts.push(alert.clone());
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use drawcast_core::StrategyId;

    use super::*;

    struct FailingSink;

    #[async_trait::async_trait]
    impl AlertSink for FailingSink {
        async fn store(&self, _alert: &Alert) -> Result<(), ProviderError> {
            Err(ProviderError::Sink {
                sink: "failing".into(),
                reason: "unreachable".into(),
            })
        }

        fn sink_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn failing_sink_does_not_block_others() {
        let memory = Arc::new(MemoryAlertSink::new());
        let sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(FailingSink), memory.clone()];
        let dispatcher = AlertDispatcher::new(sinks);
        let alert = Alert::warning(Some(StrategyId::Recency), "recency degraded");

        let results = dispatcher.dispatch(&alert).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().contains("unreachable"));
        assert!(results[1].success);
        assert_eq!(memory.alerts(), vec![alert]);
    }

    #[tokio::test]
    async fn empty_dispatcher_is_a_noop() {
        let results = AlertDispatcher::empty().dispatch(&Alert::info(None, "hello")).await;
        assert!(results.is_empty());
    }
}
