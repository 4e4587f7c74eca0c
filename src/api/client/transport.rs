//! HTTP transport helpers for `/responses` requests.

use crate::error::ApiError;
use std::time::Duration;

/// Build an HTTP client with a connect timeout applied.
///
/// The overall request timeout is set per buffered call instead, so open
/// streams are not cut off mid-answer.
pub(super) fn build_http_client(connect_timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Add an endpoint hint to 404 responses.
pub(super) fn with_diagnostic_hints(err: ApiError) -> ApiError {
    let ApiError::Status { code: 404, mut body } = err else {
        return err;
    };
    body.push_str(
        "\nHint: this endpoint may not support `/responses`; check `api.base_url` in your config.",
    );
    ApiError::status(404, body)
}
