//! ACP operation enum.

use std::fmt;

/// All supported ACP operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcpOperation {
    // Checkout
    /// Create a checkout session.
    CreateCheckoutSession,
    /// Retrieve a checkout session.
    GetCheckoutSession,
    /// Update a checkout session.
    UpdateCheckoutSession,
    /// Complete a checkout session, creating an order.
    CompleteCheckoutSession,
    /// Cancel a checkout session.
    CancelCheckoutSession,

    // Delegated payment
    /// Tokenize a delegated payment credential.
    DelegatePayment,
}

impl AcpOperation {
    /// Returns the operation name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateCheckoutSession => "CreateCheckoutSession",
            Self::GetCheckoutSession => "GetCheckoutSession",
            Self::UpdateCheckoutSession => "UpdateCheckoutSession",
            Self::CompleteCheckoutSession => "CompleteCheckoutSession",
            Self::CancelCheckoutSession => "CancelCheckoutSession",
            Self::DelegatePayment => "DelegatePayment",
        }
    }

    /// Status returned on success.
    #[must_use]
    pub fn success_status(&self) -> http::StatusCode {
        match self {
            Self::CreateCheckoutSession | Self::DelegatePayment => http::StatusCode::CREATED,
            _ => http::StatusCode::OK,
        }
    }

    /// Whether the operation reads a JSON request body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !matches!(self, Self::GetCheckoutSession | Self::CancelCheckoutSession)
    }
}

impl fmt::Display for AcpOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
