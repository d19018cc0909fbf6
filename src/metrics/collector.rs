// src/metrics/collector.rs
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;

pub const NAMESPACE: &str = "e5u6";
pub const SUBSYSTEM: &str = "api_service";

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    /// Encode every registered metric in the text exposition format.
    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    pub health_score: Gauge,

    // Fetch metrics
    pub fetches_total: IntCounterVec,
    pub fetch_duration_seconds: Histogram,

    pub monitor_triggers_total: IntCounter,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let health_score = Gauge::with_opts(
            Opts::new("health_score", "AI-powered health score of the API service")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
        )?;
        registry.register(Box::new(health_score.clone()))?;

        let fetches_total = IntCounterVec::new(
            Opts::new("fetches_total", "Total fetches of the polled endpoint")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
            &["outcome"],
        )?;
        registry.register(Box::new(fetches_total.clone()))?;

        let fetch_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "fetch_duration_seconds",
                "Duration of fetches of the polled endpoint",
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
        )?;
        registry.register(Box::new(fetch_duration_seconds.clone()))?;

        let monitor_triggers_total = IntCounter::with_opts(
            Opts::new("monitor_triggers_total", "Manual monitor triggers received")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
        )?;
        registry.register(Box::new(monitor_triggers_total.clone()))?;

        Ok(Self {
            health_score,
            fetches_total,
            fetch_duration_seconds,
            monitor_triggers_total,
        })
    }

    pub fn record_fetch(&self, success: bool, duration: std::time::Duration) {
        let outcome = if success { "success" } else { "failure" };
        self.fetches_total.with_label_values(&[outcome]).inc();
        self.fetch_duration_seconds.observe(duration.as_secs_f64());
    }

    pub fn set_health_score(&self, score: f64) {
        self.health_score.set(score);
    }

    pub fn record_trigger(&self) {
        self.monitor_triggers_total.inc();
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
