// src/metrics/exporter.rs
use super::collector::MetricsRegistry;
use crate::health::{ServiceMonitor, FAILURE_SCORE};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Pull-based exporter: the health score gauge is recomputed on every scrape.
pub struct HealthScoreExporter {
    registry: MetricsRegistry,
    monitor: Arc<ServiceMonitor>,
    // Held from setting the gauge until its exposition is encoded.
    encode_lock: Mutex<()>,
}

impl HealthScoreExporter {
    pub fn new(registry: MetricsRegistry, monitor: Arc<ServiceMonitor>) -> Self {
        Self {
            registry,
            monitor,
            encode_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    pub async fn scrape(&self) -> prometheus::Result<Vec<u8>> {
        // Detached so a scraper hanging up does not abort the fetch.
        let monitor = self.monitor.clone();
        let score = match tokio::spawn(async move { monitor.health_score().await }).await {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "Health score task failed");
                FAILURE_SCORE
            }
        };

        let _guard = self.encode_lock.lock().await;
        self.registry.collector().set_health_score(score);
        self.registry.gather()
    }
}
