//! HTTP JSON retrieval with exponential-backoff retry and a per-host
//! circuit breaker (§4.1).
//!
//! The retry/backoff shape mirrors `execute_with_retry` in the teacher's
//! `scrapers/polymarket_api.rs`: a bounded retry loop with a growing sleep
//! between attempts and a hard per-attempt timeout.

pub mod breaker;

use crate::error::ErrorKind;
use breaker::{BreakerPolicy, HostBreakers};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub initial_delay_ms: u64,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            initial_delay_ms: 300,
            factor: 2,
        }
    }
}

/// Transport timeout per provider call (§5 default 15s).
pub const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl FetchFailure {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Process-wide fetcher: one `reqwest::Client` and one shared breaker table.
/// Clone freely — internals are `Arc`-backed.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    breakers: Arc<HostBreakers>,
}

impl Fetcher {
    pub fn new(breaker_policy: BreakerPolicy) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(TRANSPORT_TIMEOUT)
            .user_agent("sportsresolve-core/0.1")
            .build()?;
        Ok(Self {
            client,
            breakers: Arc::new(HostBreakers::new(breaker_policy)),
        })
    }

    /// `fetch(url, headers?, retry?, breaker?) → payload | fail(ErrorKind)` (§4.1).
    pub async fn fetch(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
        retry: RetryPolicy,
    ) -> Result<serde_json::Value, FetchFailure> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string());

        if self.breakers.is_open(&host) {
            return Err(FetchFailure::new(
                ErrorKind::CircuitOpen,
                format!("breaker open for host {host}"),
            ));
        }

        let mut delay = retry.initial_delay_ms;
        let mut last_error = String::new();

        for attempt in 0..=retry.retries {
            let mut request = self.client.get(url);
            if let Some(headers) = headers {
                for (k, v) in headers {
                    request = request.header(k, v);
                }
            }

            match timeout(TRANSPORT_TIMEOUT, request.send()).await {
                Ok(Ok(response)) if response.status().is_success() => {
                    match response.json::<serde_json::Value>().await {
                        Ok(payload) => {
                            self.breakers.record_success(&host);
                            return Ok(payload);
                        }
                        Err(e) => last_error = format!("decode error: {e}"),
                    }
                }
                Ok(Ok(response)) => {
                    last_error = format!("http status {}", response.status());
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        warn!(host, attempt, "rate limited, backing off harder");
                        sleep(Duration::from_millis(delay * 5)).await;
                    }
                }
                Ok(Err(e)) => last_error = format!("transport error: {e}"),
                Err(_) => last_error = "request timed out".to_string(),
            }

            if attempt < retry.retries {
                debug!(host, attempt, delay, "retrying fetch");
                sleep(Duration::from_millis(delay)).await;
                delay = delay.saturating_mul(retry.factor as u64);
            }
        }

        self.breakers.record_failure(&host);
        Err(FetchFailure::new(ErrorKind::ProviderFailure, last_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_defaults_match_spec() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.initial_delay_ms, 300);
        assert_eq!(policy.factor, 2);
    }

    #[tokio::test]
    async fn open_breaker_short_circuits_without_a_request() {
        let fetcher = Fetcher::new(BreakerPolicy {
            failure_threshold: 1,
            cooldown: Duration::from_secs(60),
        })
        .unwrap();
        fetcher.breakers.record_failure("example.invalid");

        let result = fetcher
            .fetch("https://example.invalid/x", None, RetryPolicy::default())
            .await;
        assert!(matches!(result, Err(f) if f.kind == ErrorKind::CircuitOpen));
    }
}
