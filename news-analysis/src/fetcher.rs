use std::time::{Duration, Instant};

use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::types::{AnalysisError, FetchConfig, Result};

/// Why a single attempt failed, and whether another attempt could help.
enum AttemptError {
    Retryable(AnalysisError),
    Fatal(AnalysisError),
}

/// HTTP access with a bounded timeout on every request. Feed documents are retried with
/// exponential backoff on network errors and 5xx responses; timeouts and 4xx responses
/// fail immediately.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| AnalysisError::InvalidInput(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch a feed document, retrying transient failures.
    pub async fn fetch_feed(&self, url: &Url) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let delay = Duration::from_secs(self.config.retry_delay_seconds);
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: delay,
            initial_interval: delay,
            max_interval: delay * 32,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.attempt(url).await {
                Ok(content) => {
                    info!(
                        "Successfully fetched feed: {} ({} bytes in {:?})",
                        url,
                        content.len(),
                        start_time.elapsed()
                    );
                    return Ok(content);
                }
                Err(AttemptError::Retryable(e)) if attempt < self.config.max_retries => {
                    let Some(wait) = backoff.next_backoff() else {
                        return Err(e);
                    };
                    attempt += 1;
                    warn!("Attempt {} failed for {}: {}; retrying in {:?}", attempt, url, e, wait);
                    tokio::time::sleep(wait).await;
                }
                Err(AttemptError::Retryable(e)) | Err(AttemptError::Fatal(e)) => {
                    error!("Failed to fetch feed {} after {} attempts: {}", url, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }

    /// Fetch a single page once, without retries.
    pub async fn fetch_page(&self, url: &Url) -> Result<String> {
        debug!("Fetching page: {}", url);
        match self.attempt(url).await {
            Ok(content) => Ok(content),
            Err(AttemptError::Retryable(e)) | Err(AttemptError::Fatal(e)) => Err(e),
        }
    }

    async fn attempt(&self, url: &Url) -> std::result::Result<String, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let e = self.unavailable(url, format!("HTTP {}", status));
            return Err(if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                AttemptError::Retryable(e)
            } else {
                AttemptError::Fatal(e)
            });
        }

        self.check_size(url, &response).map_err(AttemptError::Fatal)?;

        response.text().await.map_err(|e| self.classify(url, e))
    }

    fn check_size(&self, url: &Url, response: &Response) -> Result<()> {
        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(self.unavailable(url, format!("response too large: {size_mb}MB")));
            }
        }
        Ok(())
    }

    fn classify(&self, url: &Url, e: reqwest::Error) -> AttemptError {
        if e.is_timeout() {
            AttemptError::Fatal(AnalysisError::Timeout {
                url: url.to_string(),
                seconds: self.config.timeout_seconds,
            })
        } else if e.is_builder() || e.is_redirect() {
            AttemptError::Fatal(self.unavailable(url, e.to_string()))
        } else {
            AttemptError::Retryable(self.unavailable(url, e.to_string()))
        }
    }

    fn unavailable(&self, url: &Url, cause: String) -> AnalysisError {
        AnalysisError::FeedUnavailable {
            source_url: url.to_string(),
            cause,
        }
    }
}
