// src/metrics/mod.rs
mod collector;
mod exporter;

pub use collector::{MetricsCollector, MetricsRegistry, Timer};
pub use exporter::HealthScoreExporter;
