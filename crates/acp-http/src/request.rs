//! Request body handling.

use acp_core::{AcpError, ErrorCode};
use acp_model::Validate;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

/// Collect a request body into a single buffer.
pub async fn collect_body<B>(body: B) -> Result<Bytes, AcpError>
where
    B: http_body::Body,
    B::Error: std::fmt::Display,
{
    body.collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            tracing::debug!(error = %e, "failed to read request body");
            AcpError::invalid_request(ErrorCode::InvalidRequest, "unable to read request body")
        })
}

/// Decode exactly one JSON document into `T`.
///
/// An empty body, unknown fields and trailing data are all rejected as
/// `invalid_request`.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AcpError> {
    if body.trim_ascii().is_empty() {
        return Err(AcpError::invalid_request(
            ErrorCode::InvalidRequest,
            "request body required",
        ));
    }
    serde_json::from_slice(body)
        .map_err(|e| AcpError::invalid_request(ErrorCode::InvalidRequest, e.to_string()))
}

/// Decode and validate a request payload.
pub fn decode_valid<T: DeserializeOwned + Validate>(body: &[u8]) -> Result<T, AcpError> {
    let value: T = decode_json(body)?;
    value.validate()?;
    Ok(value)
}
