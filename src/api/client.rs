//! Retrying HTTP client for the portfolio API
//!
//! Every logical request goes through [`ApiClient::fetch_api`], which retries
//! transport errors, non-2xx statuses and unparseable bodies with exponential
//! backoff (factor 1.5, no jitter). Failures never escape as panics; they are
//! folded into an [`ApiResult`] once the attempts run out.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
pub use reqwest::Method;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::ApiConfig;

/// Outcome of one logical API request
pub type ApiResult = Result<Value, ApiError>;

/// Errors that can occur when talking to the portfolio API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Transport failed before a response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// Server answered outside the 2xx range
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Body was not valid JSON
    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),
}

/// Per-request method, headers and JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: None,
        }
    }
}

impl RequestOptions {
    /// Default options with a different method.
    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header, keeping the defaults.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Fully resolved request handed to a [`Transport`]
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    fn new(url: String, options: &RequestOptions) -> Self {
        Self {
            method: options.method.clone(),
            url,
            headers: options.headers.clone(),
            body: options.body.as_ref().map(Value::to_string),
        }
    }
}

/// Raw status and body returned by a [`Transport`]
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends a single HTTP request
///
/// The client never retries inside a transport; one call is one attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// [`Transport`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the underlying client, applying the optional timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// How many times to retry and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay; attempt `k` waits `retry_delay * 1.5^k` before the next one
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let config = ApiConfig::default();
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }
}

impl RetryPolicy {
    /// Multiplier applied to the delay after every failed attempt
    pub const BACKOFF_FACTOR: f64 = 1.5;

    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Total number of transport attempts, first try included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to sleep after the 0-indexed `attempt` failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // 0 * inf is NaN once the factor overflows
        if self.retry_delay.is_zero() {
            return Duration::ZERO;
        }
        let factor = Self::BACKOFF_FACTOR.powi(attempt.min(i32::MAX as u32) as i32);
        Duration::try_from_secs_f64(self.retry_delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

/// Client for the portfolio REST API
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    policy: RetryPolicy,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client that talks HTTP through `reqwest`
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: &ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: crate::config::normalize_base_url(&config.base_url),
            policy: RetryPolicy::new(config.max_retries, config.retry_delay),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Absolute URL for an endpoint path
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Issue one logical request using the client's retry policy
    pub async fn fetch_api(&self, endpoint: &str, options: &RequestOptions) -> ApiResult {
        self.fetch_api_with(endpoint, options, self.policy).await
    }

    /// Issue one logical request with an explicit retry policy
    ///
    /// Performs at most `policy.max_attempts()` transport calls. Returns the
    /// parsed body of the first 2xx response, or the last failure.
    pub async fn fetch_api_with(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        policy: RetryPolicy,
    ) -> ApiResult {
        let request = HttpRequest::new(self.url_for(endpoint), options);
        let attempts = policy.max_attempts();
        let mut last_error = ApiError::Request("no attempt was made".to_string());

        for attempt in 0..attempts {
            debug!(
                method = %request.method,
                url = %request.url,
                attempt = attempt + 1,
                attempts,
                "sending request"
            );

            match self.attempt(&request).await {
                Ok(data) => return Ok(data),
                Err(err) => {
                    warn!(
                        url = %request.url,
                        attempt = attempt + 1,
                        attempts,
                        error = %err,
                        "request attempt failed"
                    );
                    last_error = err;

                    if attempt + 1 < attempts {
                        let delay = policy.delay_for(attempt);
                        debug!(url = %request.url, delay_ms = delay.as_millis() as u64, "backing off");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        error!(url = %request.url, attempts, error = %last_error, "all attempts failed");
        Err(last_error)
    }

    async fn attempt(&self, request: &HttpRequest) -> ApiResult {
        let response = self.transport.send(request).await?;
        if !(200..300).contains(&response.status) {
            return Err(ApiError::Status(response.status));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::InvalidJson(e.to_string()))
    }
}

/// Renders a result in the API's `{ success, data | error }` shape.
pub fn api_envelope(result: &ApiResult) -> Value {
    match result {
        Ok(data) => json!({ "success": true, "data": data }),
        Err(err) => json!({ "success": false, "error": err.to_string() }),
    }
}
