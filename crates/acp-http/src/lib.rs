//! HTTP service layer for the Agentic Commerce Protocol.
//!
//! This crate exposes the checkout and delegated payment APIs as hyper
//! services, providing:
//!
//! - **Router**: Maps method and path to an [`AcpOperation`](acp_model::AcpOperation)
//! - **Provider traits**: The boundary between HTTP and business logic
//! - **Signature guard**: Header checks, clock skew, canonical body verification
//! - **Authentication guard**: `Authorization: Bearer <api_key>`
//! - **Service**: Hyper `Service` implementations wiring the above together
//! - **Response helpers**: JSON success/error response formatting
//! - **Webhooks**: Signed outbound event delivery

pub mod authentication;
pub mod body;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod router;
pub mod service;
pub mod signature;
pub mod webhook;

pub use authentication::AuthenticationGuard;
pub use body::AcpResponseBody;
pub use dispatch::{CheckoutProvider, DelegatedPaymentProvider, ServiceError, ServiceResult};
pub use service::{AcpHttpConfig, CheckoutHttpService, DelegatedPaymentHttpService};
pub use signature::SignatureGuard;
pub use webhook::{WebhookConfig, WebhookError, WebhookSender};
