//! Error types for signing and authentication.

use acp_core::AcpError;

/// Errors produced while canonicalizing a JSON body.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalizationError {
    /// The body is not exactly one valid JSON document.
    #[error("malformed JSON body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// A number literal could not be normalized.
    #[error("invalid JSON number: {0}")]
    InvalidNumber(String),

    /// A number literal would expand beyond the supported integer width.
    #[error("JSON number out of range: {0}")]
    NumberOutOfRange(String),
}

/// Errors produced while verifying a request signature.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The verifier was constructed without a secret.
    #[error("signing secret must not be empty")]
    EmptyKey,

    /// The signature is not valid base64url.
    #[error("signature is not valid base64url: {0}")]
    MalformedSignature(#[from] base64::DecodeError),

    /// The recomputed MAC differs from the supplied one.
    #[error("signature mismatch")]
    Mismatch,

    /// The timestamp is not RFC 3339.
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    /// A custom verifier rejected the request.
    #[error("signature rejected: {0}")]
    Rejected(String),
}

/// Errors produced by an [`Authenticator`](crate::Authenticator).
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    /// The API key is not recognized.
    #[error("invalid API key")]
    InvalidApiKey,

    /// A structured error that must reach the client unchanged.
    #[error(transparent)]
    Acp(#[from] AcpError),

    /// Any other failure in the authentication backend.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
