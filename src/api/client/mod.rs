//! API client for the remote `/responses` service.
//!
//! The client facade stays small: connection setup and error hints live in
//! `transport`, wire handling in `api::responses`. No call is retried here;
//! retry policy belongs to the caller.

mod transport;

use super::responses;
use super::{DeltaStream, ResponsesApi, ResponsesRequest};
use crate::config::ApiConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for OpenAI-compatible `/responses` APIs.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client from resolved API configuration.
    pub fn new(config: &ApiConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        Self {
            http: transport::build_http_client(timeout),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            timeout,
        }
    }

    fn bearer(&self) -> Option<&str> {
        Some(self.api_key.as_str()).filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl ResponsesApi for ApiClient {
    async fn create(&self, request: &ResponsesRequest) -> Result<Value, ApiError> {
        debug!(model = %request.options.model, stream = false, "sending /responses request");
        responses::create(&self.http, &self.base_url, self.bearer(), self.timeout, request)
            .await
            .map_err(|err| {
                warn!(error = %err, "/responses request failed");
                transport::with_diagnostic_hints(err)
            })
    }

    async fn stream(&self, request: &ResponsesRequest) -> Result<DeltaStream, ApiError> {
        debug!(model = %request.options.model, stream = true, "sending /responses request");
        responses::stream(&self.http, &self.base_url, self.bearer(), request)
            .await
            .map_err(|err| {
                warn!(error = %err, "/responses stream failed to open");
                transport::with_diagnostic_hints(err)
            })
    }
}
