//! Grid REST client.
//!
//! [`GridClient`] talks to the grid's public API: model telemetry, async
//! job submission, and status polling. Every request carries the
//! `Client-Agent` identification header; the API key, when configured, is
//! attached to submissions only. Each call has its own deadline and there
//! are no internal retries; callers decide whether a timeout is fatal.

use std::time::Duration;

use async_trait::async_trait;

use crate::wire::{CreateJobPayload, CreateJobResponse, JobStatusResponse, ModelStatus};

/// Deadline for telemetry fetches.
const MODELS_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline for job submission. Submissions validate the whole payload
/// server-side and are the slowest call on the surface.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for a single status poll.
const STATUS_TIMEOUT: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for grid API calls.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The request deadline elapsed before a response arrived.
    #[error("Grid request timed out")]
    Timeout,

    /// The request failed below HTTP (network, DNS, TLS).
    #[error("Grid request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The grid answered with an unexpected status code.
    #[error("Grid returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("Failed to decode grid response: {0}")]
    Decode(String),
}

impl GridError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GridError::Timeout)
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GridError::Timeout
        } else {
            GridError::Transport(e)
        }
    }
}

// ---------------------------------------------------------------------------
// GridApi trait
// ---------------------------------------------------------------------------

/// The grid operations the gateway depends on.
///
/// Handlers hold a `dyn GridApi` so integration tests can substitute a
/// scripted double for the live client.
#[async_trait]
pub trait GridApi: Send + Sync {
    /// Fetch per-model worker telemetry (`GET /status/models`).
    async fn fetch_model_stats(&self) -> Result<Vec<ModelStatus>, GridError>;

    /// Submit a generation job (`POST /generate/async`, expects 202).
    ///
    /// The key is per-request: callers resolve it from the submitter's own
    /// key or the configured default before getting here.
    async fn create_job(
        &self,
        payload: &CreateJobPayload,
        api_key: &str,
    ) -> Result<CreateJobResponse, GridError>;

    /// Poll a job's status (`GET /generate/status/{id}`).
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, GridError>;
}

// ---------------------------------------------------------------------------
// GridClient
// ---------------------------------------------------------------------------

/// Live HTTP implementation of [`GridApi`].
pub struct GridClient {
    client: reqwest::Client,
    base_url: String,
    client_agent: String,
}

impl GridClient {
    /// Create a client for a grid API base URL (no trailing slash).
    ///
    /// `client_agent` identifies this gateway to the grid on every call.
    pub fn new(base_url: String, client_agent: String) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_agent,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        expected: reqwest::StatusCode,
    ) -> Result<T, GridError> {
        let status = response.status();
        if status != expected {
            let body = response.text().await.unwrap_or_default();
            return Err(GridError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await.map_err(GridError::from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(|e| GridError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GridApi for GridClient {
    async fn fetch_model_stats(&self) -> Result<Vec<ModelStatus>, GridError> {
        let response = self
            .client
            .get(self.url("/status/models"))
            .header("Client-Agent", &self.client_agent)
            .timeout(MODELS_TIMEOUT)
            .send()
            .await
            .map_err(GridError::from_reqwest)?;

        Self::decode(response, reqwest::StatusCode::OK).await
    }

    async fn create_job(
        &self,
        payload: &CreateJobPayload,
        api_key: &str,
    ) -> Result<CreateJobResponse, GridError> {
        let response = self
            .client
            .post(self.url("/generate/async"))
            .header("Client-Agent", &self.client_agent)
            .header("apikey", api_key)
            .timeout(SUBMIT_TIMEOUT)
            .json(payload)
            .send()
            .await
            .map_err(GridError::from_reqwest)?;

        tracing::debug!(
            models = ?payload.models,
            status = response.status().as_u16(),
            "Submitted generation job to grid"
        );

        Self::decode(response, reqwest::StatusCode::ACCEPTED).await
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, GridError> {
        let response = self
            .client
            .get(self.url(&format!("/generate/status/{job_id}")))
            .header("Client-Agent", &self.client_agent)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .map_err(GridError::from_reqwest)?;

        Self::decode(response, reqwest::StatusCode::OK).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
