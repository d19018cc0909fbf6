// src/health/monitor.rs
use super::fetcher::{FetchError, HttpFetcher};
use super::scorer::{ScoreError, Scorer};
use crate::config::MonitorConfig;
use crate::metrics::{MetricsCollector, Timer};
use hyper::body::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Score reported whenever the endpoint cannot be fetched or analysed.
pub const FAILURE_SCORE: f64 = 0.0;

pub struct ServiceMonitor {
    fetcher: HttpFetcher,
    scorer: Arc<dyn Scorer>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ServiceMonitor {
    pub fn new(
        config: &MonitorConfig,
        scorer: Arc<dyn Scorer>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config.api_endpoint.clone(), config.timeout())?;
        Ok(Self::with_fetcher(fetcher, scorer, metrics))
    }

    pub fn with_fetcher(
        fetcher: HttpFetcher,
        scorer: Arc<dyn Scorer>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            fetcher,
            scorer,
            metrics,
        }
    }

    /// Fetch the endpoint once, recording the outcome.
    pub async fn monitor_api(&self) -> Result<Bytes, FetchError> {
        let timer = Timer::new();
        let result = self.fetcher.fetch().await;

        if let Some(metrics) = &self.metrics {
            metrics.record_fetch(result.is_ok(), timer.elapsed());
        }

        result
    }

    pub async fn analyze_response(&self, body: &[u8]) -> Result<f64, ScoreError> {
        let score = self.scorer.score(body).await?;
        if !(0.0..=1.0).contains(&score) {
            return Err(ScoreError::OutOfRange(score));
        }
        Ok(score)
    }

    /// Fetch then analyse. Failures are swallowed into [`FAILURE_SCORE`].
    pub async fn health_score(&self) -> f64 {
        let body = match self.monitor_api().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Fetch failed, reporting zero health score");
                return FAILURE_SCORE;
            }
        };

        match self.analyze_response(&body).await {
            Ok(score) => score,
            Err(e) => {
                debug!(error = %e, "Analysis failed, reporting zero health score");
                FAILURE_SCORE
            }
        }
    }

    /// Manual trigger: fetch once and discard the outcome.
    pub async fn trigger(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_trigger();
        }

        if let Err(e) = self.monitor_api().await {
            debug!(error = %e, "Triggered fetch failed");
        }
    }
}
