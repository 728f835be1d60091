//! Error types for the Agentic Commerce Protocol.
//!
//! Every failure that reaches an ACP client is rendered as a flat JSON object
//! with `type`, `code`, `message` and an optional `param` JSON path. The HTTP
//! status and `Retry-After` hint travel alongside the payload but are never
//! serialized into it.

use std::fmt;
use std::time::Duration;

/// Broad class of an ACP error, serialized as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorType {
    /// The request was malformed or failed validation.
    #[default]
    InvalidRequest,
    /// The merchant failed to process an otherwise valid request.
    ProcessingError,
    /// The caller exceeded a rate limit.
    RateLimitExceeded,
    /// The merchant is temporarily unavailable.
    ServiceUnavailable,
}

impl ErrorType {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::ProcessingError => "processing_error",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ServiceUnavailable => "service_unavailable",
        }
    }

    /// Returns the default HTTP status code for this error type.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::InvalidRequest => http::StatusCode::BAD_REQUEST,
            Self::ProcessingError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::RateLimitExceeded => http::StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable => http::StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for ErrorType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Machine-readable ACP error code, serialized as the `code` field.
///
/// Merchants may return codes outside the well-known set through
/// [`ErrorCode::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Generic malformed request.
    #[default]
    InvalidRequest,
    /// Generic processing failure.
    ProcessingError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Service unavailable.
    ServiceUnavailable,
    /// The request was already processed.
    DuplicateRequest,
    /// An idempotency key was reused with a different payload.
    IdempotencyConflict,
    /// The supplied card was rejected.
    InvalidCard,
    /// The request signature is malformed or did not verify.
    InvalidSignature,
    /// The request was not signed but signing is required.
    SignatureRequired,
    /// The signing timestamp is outside the permitted window.
    StaleTimestamp,
    /// The `Authorization` header is absent.
    MissingAuthorization,
    /// The `Authorization` header is malformed or the key was rejected.
    InvalidAuthorization,
    /// The request cannot be retried idempotently.
    RequestNotIdempotent,
    /// A merchant-defined code.
    Custom(String),
}

impl ErrorCode {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::ProcessingError => "processing_error",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ServiceUnavailable => "service_unavailable",
            Self::DuplicateRequest => "duplicate_request",
            Self::IdempotencyConflict => "idempotency_conflict",
            Self::InvalidCard => "invalid_card",
            Self::InvalidSignature => "invalid_signature",
            Self::SignatureRequired => "signature_required",
            Self::StaleTimestamp => "stale_timestamp",
            Self::MissingAuthorization => "missing_authorization",
            Self::InvalidAuthorization => "invalid_authorization",
            Self::RequestNotIdempotent => "request_not_idempotent",
            Self::Custom(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorCode {
    fn from(value: &str) -> Self {
        match value {
            "invalid_request" => Self::InvalidRequest,
            "processing_error" => Self::ProcessingError,
            "rate_limit_exceeded" => Self::RateLimitExceeded,
            "service_unavailable" => Self::ServiceUnavailable,
            "duplicate_request" => Self::DuplicateRequest,
            "idempotency_conflict" => Self::IdempotencyConflict,
            "invalid_card" => Self::InvalidCard,
            "invalid_signature" => Self::InvalidSignature,
            "signature_required" => Self::SignatureRequired,
            "stale_timestamp" => Self::StaleTimestamp,
            "missing_authorization" => Self::MissingAuthorization,
            "invalid_authorization" => Self::InvalidAuthorization,
            "request_not_idempotent" => Self::RequestNotIdempotent,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl serde::Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A structured ACP error.
///
/// Only `type`, `code`, `message` and `param` are serialized. The status code
/// and retry hint are transport metadata consumed by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AcpError {
    /// Error class.
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// JSON path of the offending field, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// HTTP status used when rendering this error.
    #[serde(skip)]
    pub status_code: http::StatusCode,
    /// Suggested delay before retrying.
    #[serde(skip)]
    pub retry_after: Option<Duration>,
}

impl fmt::Display for AcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(self.code.as_str())
        } else {
            f.write_str(&self.message)
        }
    }
}

impl std::error::Error for AcpError {}

impl AcpError {
    /// Create an error with an explicit status, type and code.
    #[must_use]
    pub fn new(
        status_code: http::StatusCode,
        error_type: ErrorType,
        code: impl Into<ErrorCode>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            code: code.into(),
            message: message.into(),
            param: None,
            status_code,
            retry_after: None,
        }
    }

    /// Create an error whose status is the default for its type.
    #[must_use]
    pub fn with_message(
        error_type: ErrorType,
        code: impl Into<ErrorCode>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(error_type.default_status_code(), error_type, code, message)
    }

    /// Attach the JSON path of the offending field.
    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Override the HTTP status code.
    #[must_use]
    pub fn with_status(mut self, status_code: http::StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// Attach a `Retry-After` hint. A zero duration clears the hint.
    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = (!retry_after.is_zero()).then_some(retry_after);
        self
    }

    /// Returns the `Retry-After` hint in whole seconds, rounded up.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after.map(|d| {
            let secs = d.as_secs();
            if d.subsec_nanos() > 0 { secs.saturating_add(1) } else { secs }
        })
    }

    // -- Convenience constructors --

    /// Malformed request, 400.
    #[must_use]
    pub fn invalid_request(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self::with_message(ErrorType::InvalidRequest, code, message)
    }

    /// Processing failure, 500.
    #[must_use]
    pub fn processing(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self::with_message(ErrorType::ProcessingError, code, message)
    }

    /// Rate limit exceeded, 429.
    #[must_use]
    pub fn rate_limit(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self::with_message(ErrorType::RateLimitExceeded, code, message)
    }

    /// Service unavailable, 503.
    #[must_use]
    pub fn service_unavailable(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self::with_message(ErrorType::ServiceUnavailable, code, message)
    }

    /// Generic opaque failure surfaced for untyped provider errors.
    #[must_use]
    pub fn internal() -> Self {
        Self::processing(ErrorCode::ProcessingError, "internal server error")
    }

    /// Unknown route, 404.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::invalid_request(ErrorCode::Custom("not_found".to_owned()), message)
            .with_status(http::StatusCode::NOT_FOUND)
    }

    /// Known route with an unsupported method, 405.
    #[must_use]
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::invalid_request(ErrorCode::Custom("method_not_allowed".to_owned()), message)
            .with_status(http::StatusCode::METHOD_NOT_ALLOWED)
    }
}

/// Errors raised while assembling runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// A required setting was empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Only some of the webhook settings were provided.
    #[error("webhook endpoint, header and secret must be configured together")]
    IncompleteWebhook,

    /// Signed requests were required without a verifier to check them.
    #[error("signed requests are required but no signature verifier is configured")]
    MissingVerifier,
}
