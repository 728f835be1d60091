//! Shared protocol constants and per-request metadata.

/// Protocol version advertised in every `API-Version` response header.
pub const API_VERSION: &str = "2025-09-29";

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "signature";
/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "timestamp";
/// Header carrying the protocol version.
pub const API_VERSION_HEADER: &str = "api-version";
/// Header carrying the client idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
/// Header carrying the client request id.
pub const REQUEST_ID_HEADER: &str = "request-id";

/// Request metadata handed to every provider call.
///
/// Values are trimmed copies of the inbound headers; absent headers are
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Raw `Authorization` header, e.g. `Bearer api_key_123`.
    pub authorization: String,
    /// Preferred locale for messages, e.g. `en-US`.
    pub accept_language: String,
    /// Client identification string.
    pub user_agent: String,
    /// Key used to make retries idempotent.
    pub idempotency_key: String,
    /// Client supplied request id for tracing.
    pub request_id: String,
    /// Base64url request signature.
    pub signature: String,
    /// RFC 3339 signing timestamp.
    pub timestamp: String,
    /// Protocol version requested by the client.
    pub api_version: String,
}

impl RequestContext {
    /// Capture the ACP metadata headers from an inbound request.
    #[must_use]
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        Self {
            authorization: header_str(headers, http::header::AUTHORIZATION.as_str()),
            accept_language: header_str(headers, http::header::ACCEPT_LANGUAGE.as_str()),
            user_agent: header_str(headers, http::header::USER_AGENT.as_str()),
            idempotency_key: header_str(headers, IDEMPOTENCY_KEY_HEADER),
            request_id: header_str(headers, REQUEST_ID_HEADER),
            signature: header_str(headers, SIGNATURE_HEADER),
            timestamp: header_str(headers, TIMESTAMP_HEADER),
            api_version: header_str(headers, API_VERSION_HEADER),
        }
    }
}

/// Returns the trimmed value of `name`, or an empty string when absent.
///
/// Non UTF-8 bytes are replaced rather than dropped so that a present but
/// garbled header still counts as present.
#[must_use]
pub fn header_str(headers: &http::HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_capture_trimmed_headers() {
        let mut headers = http::HeaderMap::new();
        headers.insert("authorization", " Bearer 123 ".parse().unwrap());
        headers.insert("accept-language", "en-US".parse().unwrap());
        headers.insert("user-agent", "acp-test/1.0".parse().unwrap());
        headers.insert("idempotency-key", "idem-123".parse().unwrap());
        headers.insert("request-id", "req-123".parse().unwrap());
        headers.insert("api-version", "2025-09-29".parse().unwrap());

        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.authorization, "Bearer 123");
        assert_eq!(ctx.accept_language, "en-US");
        assert_eq!(ctx.user_agent, "acp-test/1.0");
        assert_eq!(ctx.idempotency_key, "idem-123");
        assert_eq!(ctx.request_id, "req-123");
        assert_eq!(ctx.api_version, "2025-09-29");
        assert!(ctx.signature.is_empty());
        assert!(ctx.timestamp.is_empty());
    }
}
