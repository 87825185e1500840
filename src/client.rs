//! ==============================================================================
//! client.rs - HTTP client for the simulation backend
//! ==============================================================================
//!
//! purpose:
//!     thin wrapper over the backend's REST endpoints. reads decode into the
//!     domain schema; writes are fire-and-forget (the backend's response body
//!     is never inspected, only its status code).
//!
//! relationships:
//!     - used by: monitor.rs (polling and command dispatch)
//!     - types: domain.rs
//!
//! ==============================================================================

use crate::domain::Status;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single backend round trip.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// the request never completed: connect failure, timeout, or a body that
    /// failed to decode
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// the request completed with a non-success HTTP status
    #[error("backend returned {status}")]
    Backend { status: StatusCode },
}

/// Client for the backend REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET /status
    pub async fn fetch_status(&self) -> Result<Status, ApiError> {
        let resp = self
            .http
            .get(format!("{}/status", self.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Backend { status: resp.status() });
        }
        Ok(resp.json::<Status>().await?)
    }

    /// POST /{command} with a JSON payload. The response body is ignored.
    pub async fn post_command(&self, command: &str, payload: &Value) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(format!("{}/{}", self.base_url, command))
            .json(payload)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Backend { status: resp.status() });
        }
        Ok(())
    }
}
