// src/health/fetcher.rs
use hyper::body::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: StatusCode },
}

/// Issues a single GET against the polled endpoint. No retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    url: Url,
    timeout: Duration,
    client: Client,
}

impl HttpFetcher {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            url,
            timeout,
            client,
        })
    }

    pub async fn fetch(&self) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(self.url.as_str())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!(url = %self.url, bytes = body.len(), "Fetched endpoint");
        Ok(body)
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: self.url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Request {
                url: self.url.to_string(),
                source: error,
            }
        }
    }
}
