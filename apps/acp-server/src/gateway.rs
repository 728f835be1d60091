//! Gateway service that routes requests to the checkout or delegated
//! payment service.
//!
//! Paths under `/agentic_commerce/` belong to the delegated payment API and
//! everything else falls through to checkout. `GET /health` is answered at
//! the gateway level.

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;

use acp_http::response::CONTENT_TYPE;
use acp_http::{
    AcpResponseBody, CheckoutHttpService, CheckoutProvider, DelegatedPaymentHttpService,
    DelegatedPaymentProvider,
};
use hyper::service::Service;

const DELEGATED_PAYMENT_PREFIX: &str = "/agentic_commerce/";
const HEALTH_PATH: &str = "/health";

/// Gateway combining the two ACP services behind one listener.
#[derive(Debug)]
pub struct GatewayService<C: CheckoutProvider, D: DelegatedPaymentProvider> {
    checkout: CheckoutHttpService<C>,
    delegated_payment: DelegatedPaymentHttpService<D>,
}

impl<C: CheckoutProvider, D: DelegatedPaymentProvider> GatewayService<C, D> {
    /// Create a new gateway.
    pub fn new(
        checkout: CheckoutHttpService<C>,
        delegated_payment: DelegatedPaymentHttpService<D>,
    ) -> Self {
        Self {
            checkout,
            delegated_payment,
        }
    }
}

impl<C: CheckoutProvider, D: DelegatedPaymentProvider> Clone for GatewayService<C, D> {
    fn clone(&self) -> Self {
        Self {
            checkout: self.checkout.clone(),
            delegated_payment: self.delegated_payment.clone(),
        }
    }
}

impl<C, D, B> Service<http::Request<B>> for GatewayService<C, D>
where
    C: CheckoutProvider,
    D: DelegatedPaymentProvider,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Display + Send,
{
    type Response = http::Response<AcpResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        if is_health_check(req.method(), req.uri().path()) {
            return Box::pin(async { Ok(health_check_response()) });
        }

        if is_delegated_payment_request(req.uri().path()) {
            return self.delegated_payment.call(req);
        }

        self.checkout.call(req)
    }
}

fn is_delegated_payment_request(path: &str) -> bool {
    path.starts_with(DELEGATED_PAYMENT_PREFIX)
}

fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == HEALTH_PATH
}

fn health_check_response() -> http::Response<AcpResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .body(AcpResponseBody::from_bytes(&br#"{"status":"ok"}"#[..]))
        .expect("static health response should be valid")
}
