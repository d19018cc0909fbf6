// src/health/scorer.rs
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("Health score {0} is outside [0, 1]")]
    OutOfRange(f64),

    #[error("Response analysis failed: {0}")]
    Analysis(String),
}

/// Maps a response body to a health score in [0, 1]; higher is healthier.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, body: &[u8]) -> Result<f64, ScoreError>;
}

/// Placeholder analysis: every successfully fetched body gets the same score.
#[derive(Debug, Clone, Copy)]
pub struct ConstantScorer {
    value: f64,
}

impl ConstantScorer {
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ScoreError::OutOfRange(value));
        }
        Ok(Self { value })
    }
}

impl Default for ConstantScorer {
    fn default() -> Self {
        Self { value: 1.0 }
    }
}

#[async_trait]
impl Scorer for ConstantScorer {
    async fn score(&self, _body: &[u8]) -> Result<f64, ScoreError> {
        Ok(self.value)
    }
}
