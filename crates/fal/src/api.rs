//! REST API client for the fal.ai HTTP endpoints.
//!
//! Wraps the synchronous run endpoint, the request queue (submit, status,
//! result, cancel) and downloads of generated files using [`reqwest`].

use std::time::Duration;

use signage_core::generation::app_id;

use crate::messages::{QueueStatus, QueueSubmission};

/// Default base URL of the synchronous run endpoint.
pub const DEFAULT_RUN_URL: &str = "https://fal.run";

/// Default base URL of the request queue.
pub const DEFAULT_QUEUE_URL: &str = "https://queue.fal.run";

/// Default per-request timeout. Synchronous runs block until the model
/// finishes, so this is generous.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection settings for [`FalApi`].
#[derive(Debug, Clone)]
pub struct FalConfig {
    /// API key sent as `Authorization: Key <key>`. Empty disables submission.
    pub api_key: String,
    /// Base URL for synchronous runs (default: `https://fal.run`).
    pub run_url: String,
    /// Base URL for the queue (default: `https://queue.fal.run`).
    pub queue_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl FalConfig {
    /// Load from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `FAL_KEY`               | *(empty)*               |
    /// | `FAL_RUN_URL`           | `https://fal.run`       |
    /// | `FAL_QUEUE_URL`         | `https://queue.fal.run` |
    /// | `FAL_REQUEST_TIMEOUT_SECS` | `300`                |
    pub fn from_env() -> Self {
        let request_timeout = std::env::var("FAL_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self {
            api_key: std::env::var("FAL_KEY").unwrap_or_default(),
            run_url: std::env::var("FAL_RUN_URL").unwrap_or_else(|_| DEFAULT_RUN_URL.into()),
            queue_url: std::env::var("FAL_QUEUE_URL").unwrap_or_else(|_| DEFAULT_QUEUE_URL.into()),
            request_timeout,
        }
    }
}

impl Default for FalConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            run_url: DEFAULT_RUN_URL.into(),
            queue_url: DEFAULT_QUEUE_URL.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Errors from the fal REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum FalApiError {
    /// No API key is configured.
    #[error("FAL_KEY is not configured")]
    MissingApiKey,

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// fal returned a non-2xx status code.
    #[error("fal API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A downloaded file with the content type the server reported.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// HTTP client for fal.ai.
pub struct FalApi {
    client: reqwest::Client,
    config: FalConfig,
}

impl FalApi {
    /// Create a client with its own connection pool.
    pub fn new(config: FalConfig) -> Result<Self, FalApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: FalConfig) -> Self {
        Self { client, config }
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Run a model synchronously.
    ///
    /// Sends `POST {run_url}/{model}` and returns the result document.
    pub async fn run(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> Result<serde_json::Value, FalApiError> {
        let url = format!("{}/{model}", self.config.run_url);
        tracing::debug!(%model, "Running fal model synchronously");
        let response = self.authorized(self.client.post(url))?.json(input).send().await?;
        Self::parse_response(response).await
    }

    /// Queue a request.
    ///
    /// Sends `POST {queue_url}/{model}` and returns the request id.
    pub async fn submit(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> Result<QueueSubmission, FalApiError> {
        let url = format!("{}/{model}", self.config.queue_url);
        tracing::debug!(%model, "Submitting fal request to queue");
        let response = self.authorized(self.client.post(url))?.json(input).send().await?;
        Self::parse_response(response).await
    }

    /// Check the status of a queued request.
    ///
    /// Sends `GET {queue_url}/{app_id}/requests/{request_id}/status`.
    pub async fn status(&self, model: &str, request_id: &str) -> Result<QueueStatus, FalApiError> {
        let url = format!("{}/status", self.request_url(model, request_id));
        let response = self.authorized(self.client.get(url))?.send().await?;
        Self::parse_response(response).await
    }

    /// Fetch the result document of a completed request.
    ///
    /// Sends `GET {queue_url}/{app_id}/requests/{request_id}`.
    pub async fn result(
        &self,
        model: &str,
        request_id: &str,
    ) -> Result<serde_json::Value, FalApiError> {
        let url = self.request_url(model, request_id);
        let response = self.authorized(self.client.get(url))?.send().await?;
        Self::parse_response(response).await
    }

    /// Ask fal to cancel a queued request.
    ///
    /// Sends `PUT {queue_url}/{app_id}/requests/{request_id}/cancel`.
    /// Requests already running may still complete.
    pub async fn cancel(&self, model: &str, request_id: &str) -> Result<(), FalApiError> {
        let url = format!("{}/cancel", self.request_url(model, request_id));
        let response = self.authorized(self.client.put(url))?.send().await?;
        Self::check_status(response).await
    }

    /// Download a generated file. fal CDN URLs are public, so no
    /// credentials are attached.
    pub async fn download(&self, url: &str) -> Result<DownloadedFile, FalApiError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(DownloadedFile {
            bytes,
            content_type,
        })
    }

    // ---- private helpers ----

    fn request_url(&self, model: &str, request_id: &str) -> String {
        format!(
            "{}/{}/requests/{request_id}",
            self.config.queue_url,
            app_id(model)
        )
    }

    /// Attach the `Authorization: Key ...` header, or fail if no key is set.
    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, FalApiError> {
        if self.config.api_key.is_empty() {
            return Err(FalApiError::MissingApiKey);
        }
        Ok(builder.header(
            reqwest::header::AUTHORIZATION,
            format!("Key {}", self.config.api_key),
        ))
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`FalApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, FalApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FalApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, FalApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice::<T>(&body)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), FalApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
