//! Bearer token authentication.

use std::fmt;
use std::sync::Arc;

use acp_auth::{AuthenticationError, Authenticator};
use acp_core::{AcpError, ErrorCode, RequestContext};
use tracing::debug;

/// Enforces `Authorization: Bearer <api_key>` for one service.
#[derive(Clone)]
pub struct AuthenticationGuard {
    authenticator: Arc<dyn Authenticator>,
}

impl fmt::Debug for AuthenticationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationGuard")
            .field("authenticator", &"...")
            .finish()
    }
}

impl AuthenticationGuard {
    /// Create a guard backed by `authenticator`.
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Authenticate the request described by `ctx`.
    ///
    /// Structured errors from the authenticator are returned unchanged; any
    /// other failure becomes `invalid_authorization`.
    pub async fn authenticate(&self, ctx: &RequestContext) -> Result<(), AcpError> {
        let api_key = bearer_token(&ctx.authorization)?;

        match self.authenticator.authenticate(api_key, ctx).await {
            Ok(()) => Ok(()),
            Err(AuthenticationError::Acp(err)) => Err(err),
            Err(err) => {
                debug!(error = %err, "API key rejected");
                Err(unauthorized(ErrorCode::InvalidAuthorization, "invalid API key"))
            }
        }
    }
}

/// Extract the token from a trimmed `Authorization` header value.
pub fn bearer_token(authorization: &str) -> Result<&str, AcpError> {
    if authorization.is_empty() {
        return Err(unauthorized(
            ErrorCode::MissingAuthorization,
            "Authorization header is required",
        ));
    }
    let Some((scheme, token)) = authorization.split_once(' ') else {
        return Err(malformed());
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(malformed());
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(unauthorized(ErrorCode::InvalidAuthorization, "API key is required"));
    }
    Ok(token)
}

fn malformed() -> AcpError {
    unauthorized(
        ErrorCode::InvalidAuthorization,
        "Authorization header must be in the format 'Bearer <api_key>'",
    )
}

fn unauthorized(code: ErrorCode, message: &str) -> AcpError {
    AcpError::invalid_request(code, message).with_status(http::StatusCode::UNAUTHORIZED)
}
