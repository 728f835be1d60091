//! Provider traits and operation dispatch.
//!
//! Providers own the business logic. The HTTP layer decodes and validates
//! requests before calling them, and renders whatever they return.

use acp_core::{AcpError, RequestContext};
use acp_model::AcpOperation;
use acp_model::checkout::{
    CheckoutSession, CheckoutSessionCompleteRequest, CheckoutSessionCreateRequest,
    CheckoutSessionUpdateRequest, SessionWithOrder,
};
use acp_model::delegated_payment::{PaymentRequest, VaultToken};
use async_trait::async_trait;
use tracing::{debug, error};

use crate::body::AcpResponseBody;
use crate::request::decode_valid;
use crate::response::json_response;
use crate::router::AcpRoute;

/// Error returned by providers.
///
/// Structured errors reach the client unchanged. Anything else is logged
/// and reported as a generic internal error.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A structured protocol error.
    #[error(transparent)]
    Acp(#[from] AcpError),

    /// An unexpected failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Convert into the error the client sees.
    #[must_use]
    pub fn into_acp_error(self) -> AcpError {
        match self {
            Self::Acp(err) => err,
            Self::Internal(err) => {
                error!(error = %err, "provider failed");
                AcpError::internal()
            }
        }
    }
}

/// Convenience result type for provider calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Business logic behind the checkout API.
#[async_trait]
pub trait CheckoutProvider: Send + Sync + 'static {
    /// Create a session from the requested items.
    async fn create_session(
        &self,
        ctx: &RequestContext,
        req: CheckoutSessionCreateRequest,
    ) -> ServiceResult<CheckoutSession>;

    /// Apply changes to an open session.
    async fn update_session(
        &self,
        ctx: &RequestContext,
        id: &str,
        req: CheckoutSessionUpdateRequest,
    ) -> ServiceResult<CheckoutSession>;

    /// Retrieve a session.
    async fn get_session(&self, ctx: &RequestContext, id: &str) -> ServiceResult<CheckoutSession>;

    /// Pay for a session and create its order.
    async fn complete_session(
        &self,
        ctx: &RequestContext,
        id: &str,
        req: CheckoutSessionCompleteRequest,
    ) -> ServiceResult<SessionWithOrder>;

    /// Cancel a session.
    async fn cancel_session(&self, ctx: &RequestContext, id: &str)
    -> ServiceResult<CheckoutSession>;
}

/// Business logic behind the delegated payment API, typically a PSP vault.
#[async_trait]
pub trait DelegatedPaymentProvider: Send + Sync + 'static {
    /// Tokenize the delegated credential.
    async fn delegate_payment(
        &self,
        ctx: &RequestContext,
        req: PaymentRequest,
    ) -> ServiceResult<VaultToken>;
}

/// Dispatch a checkout operation to the provider.
pub async fn dispatch_checkout<P: CheckoutProvider>(
    provider: &P,
    route: &AcpRoute,
    ctx: &RequestContext,
    body: &[u8],
) -> Result<http::Response<AcpResponseBody>, AcpError> {
    let op = route.operation;
    debug!(operation = %op, "dispatching checkout operation");
    let id = route.session_id.as_deref().unwrap_or_default();
    let status = op.success_status();

    let response = match op {
        AcpOperation::CreateCheckoutSession => {
            let req = decode_valid(body)?;
            json_response(
                status,
                &provider.create_session(ctx, req).await.map_err(ServiceError::into_acp_error)?,
            )
        }
        AcpOperation::GetCheckoutSession => json_response(
            status,
            &provider.get_session(ctx, id).await.map_err(ServiceError::into_acp_error)?,
        ),
        AcpOperation::UpdateCheckoutSession => {
            let req = decode_valid(body)?;
            json_response(
                status,
                &provider
                    .update_session(ctx, id, req)
                    .await
                    .map_err(ServiceError::into_acp_error)?,
            )
        }
        AcpOperation::CompleteCheckoutSession => {
            let req = decode_valid(body)?;
            json_response(
                status,
                &provider
                    .complete_session(ctx, id, req)
                    .await
                    .map_err(ServiceError::into_acp_error)?,
            )
        }
        AcpOperation::CancelCheckoutSession => json_response(
            status,
            &provider.cancel_session(ctx, id).await.map_err(ServiceError::into_acp_error)?,
        ),
        AcpOperation::DelegatePayment => {
            return Err(AcpError::not_found("delegate_payment is not a checkout operation"));
        }
    };
    Ok(response)
}

/// Dispatch the delegated payment operation to the provider.
pub async fn dispatch_delegated_payment<P: DelegatedPaymentProvider>(
    provider: &P,
    ctx: &RequestContext,
    body: &[u8],
) -> Result<http::Response<AcpResponseBody>, AcpError> {
    debug!(operation = %AcpOperation::DelegatePayment, "dispatching delegated payment");
    let req: PaymentRequest = decode_valid(body)?;
    let token = provider
        .delegate_payment(ctx, req)
        .await
        .map_err(ServiceError::into_acp_error)?;
    Ok(json_response(
        AcpOperation::DelegatePayment.success_status(),
        &token,
    ))
}
