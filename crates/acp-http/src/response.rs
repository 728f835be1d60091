//! ACP response serialization and error formatting.

use acp_core::{API_VERSION, API_VERSION_HEADER, AcpError};
use serde::Serialize;
use tracing::error;

use crate::body::AcpResponseBody;

/// Content type for every ACP response.
pub const CONTENT_TYPE: &str = "application/json";

/// Serialize an [`AcpError`] into its wire form.
///
/// ```json
/// {"type": "invalid_request", "code": "invalid_signature", "message": "..."}
/// ```
#[must_use]
pub fn error_to_json(error: &AcpError) -> Vec<u8> {
    serde_json::to_vec(error).expect("JSON serialization of error cannot fail")
}

/// Convert an [`AcpError`] into a complete HTTP error response.
///
/// A positive retry hint is emitted as `Retry-After` in whole seconds,
/// rounded up.
#[must_use]
pub fn error_to_response(error: &AcpError) -> http::Response<AcpResponseBody> {
    let body = AcpResponseBody::from_bytes(error_to_json(error));

    let mut builder = http::Response::builder()
        .status(error.status_code)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .header(API_VERSION_HEADER, API_VERSION);
    if let Some(secs) = error.retry_after_secs().filter(|s| *s > 0) {
        builder = builder.header(http::header::RETRY_AFTER, secs);
    }

    builder.body(body).expect("valid error response")
}

/// Build a success response by serializing `payload`.
#[must_use]
pub fn json_response<T: Serialize>(
    status: http::StatusCode,
    payload: &T,
) -> http::Response<AcpResponseBody> {
    let json = match serde_json::to_vec(payload) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "failed to serialize response payload");
            return error_to_response(&AcpError::internal());
        }
    };

    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .header(API_VERSION_HEADER, API_VERSION)
        .body(AcpResponseBody::from_bytes(json))
        .expect("valid JSON response")
}

/// Ensure the protocol headers are present on every response.
#[must_use]
pub fn add_common_headers(
    mut response: http::Response<AcpResponseBody>,
) -> http::Response<AcpResponseBody> {
    let headers = response.headers_mut();
    headers
        .entry(http::header::CONTENT_TYPE)
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));
    headers
        .entry(API_VERSION_HEADER)
        .or_insert(http::HeaderValue::from_static(API_VERSION));
    response
}
