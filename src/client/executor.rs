use crate::config::FluxConfig;
use crate::error::{FluxError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Sends HTTP calls to the API, classifies failures, and applies the
/// retry/backoff policy. Stateless across calls; the underlying
/// connection pool is reused but carries no per-call data.
///
/// Policy: 5xx, timeouts, and connection failures are retried with a
/// `2^attempt` second backoff up to the configured attempt budget, after
/// which `RetriesExhausted` is surfaced. 401 and 429 fail immediately.
/// Other 4xx fail immediately and carry the server-provided message when
/// the body is JSON with an `error` field.
#[derive(Clone)]
pub struct RequestExecutor {
    client: reqwest::Client,
    config: Arc<FluxConfig>,
}

impl RequestExecutor {
    pub fn new(config: Arc<FluxConfig>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        if let Some(api_key) = config.api_key.as_deref() {
            let bearer = format!("Bearer {}", api_key);
            let mut value = HeaderValue::from_str(&bearer)
                .map_err(|e| FluxError::ConfigError(format!("invalid API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("flux-kontext-rs/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| FluxError::ClientError(format!("failed to build HTTP client: {}", e)))?;

        Ok(RequestExecutor { client, config })
    }

    /// Execute a call and parse the response body as JSON.
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let response = self.send_with_retry(method, endpoint, payload, timeout).await?;
        response
            .json()
            .await
            .map_err(|e| FluxError::ResponseError(format!("invalid JSON body: {}", e)))
    }

    /// Execute a call and return the raw response body. Used for the
    /// chat-style endpoint, which has no fixed schema.
    pub async fn execute_text(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let response = self.send_with_retry(method, endpoint, payload, timeout).await?;
        response
            .text()
            .await
            .map_err(|e| FluxError::ResponseError(format!("failed to read body: {}", e)))
    }

    async fn send_with_retry(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.config.api_base_url, endpoint);
        let timeout = timeout.unwrap_or(self.config.timeout);
        let max_retries = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 0..max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s after the first failure, then 2s, 4s, …
                let backoff = Duration::from_secs(1u64 << (attempt - 1));
                log::debug!(
                    "Retrying {} in {:?} (attempt {}/{})",
                    endpoint,
                    backoff,
                    attempt + 1,
                    max_retries
                );
                sleep(backoff).await;
            }

            let mut request = self.client.request(method.clone(), &url).timeout(timeout);
            if let Some(payload) = payload {
                request = request.json(payload);
            }

            let error = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    match status.as_u16() {
                        401 => FluxError::AuthInvalid,
                        429 => FluxError::RateLimited,
                        code if status.is_server_error() => FluxError::ServerError(code),
                        code => {
                            let body = response.text().await.unwrap_or_default();
                            FluxError::BadRequest(bad_request_message(code, &body))
                        }
                    }
                }
                Err(e) if e.is_timeout() => FluxError::Timeout(e.to_string()),
                Err(e) => FluxError::ConnectionError(e.to_string()),
            };

            if !error.is_retryable() {
                return Err(error);
            }
            log::warn!("Request to {} failed: {}", endpoint, error);
            last_error = error.to_string();
        }

        Err(FluxError::RetriesExhausted {
            attempts: max_retries,
            last_error,
        })
    }
}

/// Build the `BadRequest` message, folding in the server's own error
/// message when the body parses as JSON with an `error` field.
fn bad_request_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(error) = value.get("error") {
            if let Some(message) = error.get("message").and_then(Value::as_str) {
                return format!("HTTP {} - {}", status, message);
            }
            if let Some(message) = error.as_str() {
                return format!("HTTP {} - {}", status, message);
            }
        }
    }
    format!("HTTP {}", status)
}
