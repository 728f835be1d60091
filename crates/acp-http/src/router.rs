//! ACP request router.
//!
//! Checkout routes are REST style, with the session id as a path segment:
//!
//! ```text
//! POST /checkout_sessions
//! GET  /checkout_sessions/{id}
//! POST /checkout_sessions/{id}
//! POST /checkout_sessions/{id}/complete
//! POST /checkout_sessions/{id}/cancel
//! POST /agentic_commerce/delegate_payment
//! ```

use acp_core::{AcpError, ErrorCode};
use acp_model::AcpOperation;
use percent_encoding::percent_decode_str;

const CHECKOUT_SESSIONS: &str = "checkout_sessions";
const DELEGATE_PAYMENT_PATH: &str = "/agentic_commerce/delegate_payment";

/// A resolved route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcpRoute {
    /// The operation to run.
    pub operation: AcpOperation,
    /// Decoded checkout session id, for routes that carry one.
    pub session_id: Option<String>,
}

impl AcpRoute {
    fn new(operation: AcpOperation) -> Self {
        Self {
            operation,
            session_id: None,
        }
    }

    fn with_session(operation: AcpOperation, id: &str) -> Result<Self, AcpError> {
        let decoded = percent_decode_str(id)
            .decode_utf8()
            .map_err(|_| {
                AcpError::invalid_request(
                    ErrorCode::InvalidRequest,
                    "checkout_session_id must be valid UTF-8",
                )
            })?;
        if decoded.is_empty() {
            return Err(AcpError::invalid_request(
                ErrorCode::InvalidRequest,
                "checkout_session_id is required",
            ));
        }
        Ok(Self {
            operation,
            session_id: Some(decoded.into_owned()),
        })
    }
}

/// Resolve a checkout operation from the request method and path.
pub fn resolve_checkout(method: &http::Method, path: &str) -> Result<AcpRoute, AcpError> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(not_found(path));
    };
    let segments: Vec<&str> = rest.split('/').collect();

    match segments.as_slice() {
        [CHECKOUT_SESSIONS] => match *method {
            http::Method::POST => Ok(AcpRoute::new(AcpOperation::CreateCheckoutSession)),
            _ => Err(method_not_allowed(method, path)),
        },
        [CHECKOUT_SESSIONS, id] => match *method {
            http::Method::GET => AcpRoute::with_session(AcpOperation::GetCheckoutSession, id),
            http::Method::POST => AcpRoute::with_session(AcpOperation::UpdateCheckoutSession, id),
            _ => Err(method_not_allowed(method, path)),
        },
        [CHECKOUT_SESSIONS, id, action @ ("complete" | "cancel")] => {
            if *method != http::Method::POST {
                return Err(method_not_allowed(method, path));
            }
            let op = if *action == "complete" {
                AcpOperation::CompleteCheckoutSession
            } else {
                AcpOperation::CancelCheckoutSession
            };
            AcpRoute::with_session(op, id)
        }
        _ => Err(not_found(path)),
    }
}

/// Resolve the delegated payment operation from the request method and path.
pub fn resolve_delegated_payment(method: &http::Method, path: &str) -> Result<AcpRoute, AcpError> {
    if path != DELEGATE_PAYMENT_PATH {
        return Err(not_found(path));
    }
    if *method != http::Method::POST {
        return Err(method_not_allowed(method, path));
    }
    Ok(AcpRoute::new(AcpOperation::DelegatePayment))
}

fn not_found(path: &str) -> AcpError {
    AcpError::not_found(format!("no route for {path}"))
}

fn method_not_allowed(method: &http::Method, path: &str) -> AcpError {
    AcpError::method_not_allowed(format!("{method} is not allowed on {path}"))
}
