// src/health/mod.rs
mod fetcher;
mod monitor;
mod scorer;

pub use fetcher::{FetchError, HttpFetcher};
pub use monitor::{ServiceMonitor, FAILURE_SCORE};
pub use scorer::{ConstantScorer, ScoreError, Scorer};

#[cfg(test)]
pub(crate) use fetcher::tests::unreachable_url;
