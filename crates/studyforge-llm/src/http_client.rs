//! Shared HTTP client for the generation proxy
//!
//! One `reqwest::Client` per process with connect timeouts, per-request
//! timeouts and a retry policy for server and network failures.

use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use studyforge_utils::error::LlmError;
use studyforge_utils::redaction::redact_error_message;

/// Upper bound on any single request timeout (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of retry attempts for 5xx and network failures
const MAX_RETRIES: u32 = 2;

/// Backoff unit; attempt `n` waits `n` units before retrying.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Words in an error body that mean the provider refused the content.
const SAFETY_MARKERS: &[&str] = &["safety", "policy", "blocked"];

/// Longest error body carried into an error message.
const MAX_BODY_IN_ERROR: usize = 500;

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
    backoff: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .use_rustls_tls()
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout: DEFAULT_MAX_HTTP_TIMEOUT,
            backoff: INITIAL_BACKOFF,
        })
    }

    /// Shorten the retry backoff (tests).
    #[cfg(test)]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Execute an HTTP request with timeout and retry policy
    ///
    /// - Per-request timeout: `min(request_timeout, 5 min)`
    /// - Up to 2 retries for 5xx and network failures, waiting 1s then 2s
    /// - No retries for 4xx errors
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403
    /// - `LlmError::ProviderQuota` for 429
    /// - `LlmError::Misconfiguration` for 404
    /// - `LlmError::ContentBlocked` when an error body mentions a safety refusal
    /// - `LlmError::ProviderOutage` for 5xx after retries
    /// - `LlmError::Timeout` for timeouts
    /// - `LlmError::Transport` for other 4xx and for network errors after retries
    pub async fn execute_with_retry(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| {
                    LlmError::Transport("Failed to clone request for retry".to_string())
                })?
                .timeout(effective_timeout)
                .build()
                .map_err(|e| LlmError::Transport(format!("Failed to build request: {}", e)))?;

            debug!(
                provider = provider_name,
                attempt = attempt,
                timeout_secs = effective_timeout.as_secs(),
                "Executing HTTP request"
            );

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    let body = response.text().await.unwrap_or_default();
                    if mentions_safety(&body) {
                        return Err(LlmError::ContentBlocked(clip(&body)));
                    }

                    if status.is_client_error() {
                        return Err(map_client_error(status, &body, provider_name));
                    }

                    if attempt <= MAX_RETRIES {
                        warn!(
                            provider = provider_name,
                            attempt = attempt,
                            status = status.as_u16(),
                            "Server error, will retry"
                        );
                        tokio::time::sleep(self.backoff * attempt).await;
                        continue;
                    }

                    return Err(LlmError::ProviderOutage(format!(
                        "{} returned server error: HTTP {}{}",
                        provider_name,
                        status.as_u16(),
                        body_suffix(&body)
                    )));
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(LlmError::Timeout {
                            duration: effective_timeout,
                        });
                    }

                    if attempt <= MAX_RETRIES {
                        warn!(
                            provider = provider_name,
                            attempt = attempt,
                            error = %redact_error_message(&e.to_string()),
                            "Network error, will retry"
                        );
                        tokio::time::sleep(self.backoff * attempt).await;
                        continue;
                    }

                    return Err(LlmError::Transport(format!(
                        "{} request failed: network error: {}",
                        provider_name,
                        redact_error_message(&e.to_string())
                    )));
                }
            }
        }
    }
}

/// Whether an error body reads like a content-safety refusal.
pub(crate) fn mentions_safety(body: &str) -> bool {
    let lower = body.to_lowercase();
    SAFETY_MARKERS.iter().any(|m| lower.contains(m))
}

fn clip(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_BODY_IN_ERROR) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

fn body_suffix(body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", redact_error_message(&clip(body)))
    }
}

/// Map HTTP client error status codes to LlmError variants
///
/// - 401/403 → `LlmError::ProviderAuth`
/// - 429 → `LlmError::ProviderQuota`
/// - 404 → `LlmError::Misconfiguration` (endpoint not deployed or wrong URL)
/// - Other 4xx → `LlmError::Transport` carrying the body text
fn map_client_error(status: StatusCode, body: &str, provider_name: &str) -> LlmError {
    let code = status.as_u16();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(format!(
            "{} authentication failed: HTTP {} (unauthorized){}",
            provider_name,
            code,
            body_suffix(body)
        )),
        StatusCode::TOO_MANY_REQUESTS => LlmError::ProviderQuota(format!(
            "{} rate limit exceeded: HTTP {}{}",
            provider_name,
            code,
            body_suffix(body)
        )),
        StatusCode::NOT_FOUND => LlmError::Misconfiguration(format!(
            "{} returned HTTP 404 (function not deployed or wrong URL)",
            provider_name
        )),
        _ => LlmError::Transport(format!(
            "{} returned HTTP {}{}",
            provider_name,
            code,
            body_suffix(body)
        )),
    }
}
