//! HTTP transport with failure classification and retry.
//!
//! One [`Transport`] is created per scrape run and owns a reusable
//! [`reqwest::Client`] (connection pool, default headers, timeout). It is
//! exclusively owned by that run and not designed for concurrent reuse.
//!
//! # Outcome classification
//!
//! - success: passed through to the caller
//! - transient (timeout, connect failure, 408/429, 5xx): eligible for retry
//! - permanent (other 4xx, malformed payloads): surfaced immediately
//!
//! # Retry Strategy
//!
//! - Up to `retry_count` additional attempts per call
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Exhausting all attempts yields a transient-failure value the caller turns
//! into a skipped story, never a process fault.

use rand::{rng, Rng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, Response, StatusCode};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

use crate::config::ScrapingConfig;
use crate::error::ScrapeError;

/// Browser-like identity the sources expect from a desktop reader.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ACCEPT_LANGUAGE_VALUE: &str = "bn,en;q=0.9,en-US;q=0.8";

/// Initial delay between retries (doubles with each attempt).
const BASE_DELAY: Duration = Duration::from_secs(1);
/// Maximum delay cap to prevent excessive waiting.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Reusable HTTP session for a single scrape run.
pub struct Transport {
    client: Client,
    retry_count: u32,
}

impl Transport {
    /// Build the session from the run's configuration.
    pub fn new(config: &ScrapingConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            retry_count: config.retry_count,
        })
    }

    /// GET a URL and return the response body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.get_with_retry(url).await?;
        response
            .text()
            .await
            .map_err(|e| ScrapeError::Transient(format!("reading body from {url}: {e}")))
    }

    /// GET a URL and return the raw response, for streaming consumption.
    pub async fn get_response(&self, url: &str) -> Result<Response, ScrapeError> {
        self.get_with_retry(url).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_with_retry(&self, url: &str) -> Result<Response, ScrapeError> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            match self.get_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.retry_count => {
                    attempt += 1;
                    let delay = backoff_delay(attempt);
                    warn!(
                        attempt,
                        max = self.retry_count,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "request failed; backing off"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    if e.is_transient() && self.retry_count > 0 {
                        error!(
                            attempts = attempt + 1,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "request exhausted retries"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<Response, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))?;
        classify_status(url, response)
    }
}

fn classify_request_error(url: &str, e: &reqwest::Error) -> ScrapeError {
    if e.is_builder() || e.is_request() {
        // The URL itself is unusable; no retry will fix it.
        ScrapeError::Permanent(format!("{url}: {e}"))
    } else {
        // Timeouts, connect failures, and interrupted transfers.
        ScrapeError::Transient(format!("{url}: {e}"))
    }
}

fn classify_status(url: &str, response: Response) -> Result<Response, ScrapeError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if is_transient_status(status) {
        Err(ScrapeError::Transient(format!("{url}: HTTP {status}")))
    } else {
        Err(ScrapeError::Permanent(format!("{url}: HTTP {status}")))
    }
}

/// Server-side errors and throttling responses are worth retrying;
/// other client errors are not.
fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

/// `delay = min(base * 2^(attempt-1), cap) + jitter(0..=250ms)`
fn backoff_delay(attempt: u32) -> Duration {
    // 2^5 s already exceeds the cap, so clamp the exponent.
    let exponent = (attempt.saturating_sub(1)).min(5);
    let mut delay = BASE_DELAY.saturating_mul(1 << exponent);
    if delay > MAX_DELAY {
        delay = MAX_DELAY;
    }
    let jitter_ms: u64 = rng().random_range(0..=250);
    delay + Duration::from_millis(jitter_ms)
}
