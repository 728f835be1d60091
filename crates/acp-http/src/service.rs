//! ACP HTTP services implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use acp_auth::{Authenticator, SignatureVerifier};
use acp_core::{
    AcpError, Clock, ConfigError, DEFAULT_MAX_CLOCK_SKEW, REQUEST_ID_HEADER, RequestContext,
    SystemClock,
};
use bytes::Bytes;
use tracing::{Instrument, debug, info, info_span};

use crate::authentication::AuthenticationGuard;
use crate::body::AcpResponseBody;
use crate::dispatch::{
    CheckoutProvider, DelegatedPaymentProvider, dispatch_checkout, dispatch_delegated_payment,
};
use crate::request::collect_body;
use crate::response::{add_common_headers, error_to_response};
use crate::router::{AcpRoute, resolve_checkout, resolve_delegated_payment};
use crate::signature::SignatureGuard;

/// Configuration shared by the ACP HTTP services.
#[derive(Clone)]
pub struct AcpHttpConfig {
    /// Verifier for inbound signatures. `None` disables signature checks.
    pub signature_verifier: Option<Arc<dyn SignatureVerifier>>,
    /// Reject requests that carry no signature at all.
    pub require_signed_requests: bool,
    /// Maximum tolerated distance between `Timestamp` and now. Zero disables.
    pub max_clock_skew: Duration,
    /// Bearer key authenticator. `None` disables authentication.
    pub authenticator: Option<Arc<dyn Authenticator>>,
    /// Time source for freshness checks.
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AcpHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcpHttpConfig")
            .field(
                "signature_verifier",
                &self.signature_verifier.as_ref().map(|_| "..."),
            )
            .field("require_signed_requests", &self.require_signed_requests)
            .field("max_clock_skew", &self.max_clock_skew)
            .field("authenticator", &self.authenticator.as_ref().map(|_| "..."))
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for AcpHttpConfig {
    fn default() -> Self {
        Self {
            signature_verifier: None,
            require_signed_requests: false,
            max_clock_skew: DEFAULT_MAX_CLOCK_SKEW,
            authenticator: None,
            clock: Arc::new(SystemClock),
        }
    }
}

/// The guards a request passes before it reaches a provider.
#[derive(Debug, Clone)]
struct Guards {
    signature: Option<SignatureGuard>,
    authentication: Option<AuthenticationGuard>,
}

/// A request body that may already have been buffered for verification.
enum Payload<B> {
    Streaming(B),
    Buffered(Bytes),
}

impl Guards {
    fn from_config(config: AcpHttpConfig) -> Result<Self, ConfigError> {
        let signature = match config.signature_verifier {
            Some(verifier) => Some(SignatureGuard::new(
                verifier,
                config.require_signed_requests,
                config.max_clock_skew,
                config.clock,
            )),
            None if config.require_signed_requests => return Err(ConfigError::MissingVerifier),
            None => None,
        };
        Ok(Self {
            signature,
            authentication: config.authenticator.map(AuthenticationGuard::new),
        })
    }

    /// Run the signature and authentication checks, returning the body.
    ///
    /// Signed requests are buffered before authentication because the
    /// signature covers the body. Unsigned requests are only read once
    /// authentication has passed, and not at all for bodiless operations.
    async fn admit<B>(
        &self,
        route: &AcpRoute,
        parts: &http::request::Parts,
        body: B,
        ctx: &RequestContext,
    ) -> Result<Bytes, AcpError>
    where
        B: http_body::Body,
        B::Error: Display,
    {
        let pending = match &self.signature {
            Some(guard) => guard.inspect(&parts.headers)?.map(|pending| (guard, pending)),
            None => None,
        };
        let payload = match pending {
            Some((guard, pending)) => {
                let bytes = collect_body(body).await?;
                guard.verify(pending, parts, &bytes)?;
                Payload::Buffered(bytes)
            }
            None => Payload::Streaming(body),
        };

        if let Some(guard) = &self.authentication {
            guard.authenticate(ctx).await?;
        }

        match payload {
            Payload::Buffered(bytes) => Ok(bytes),
            Payload::Streaming(_) if !route.operation.has_body() => Ok(Bytes::new()),
            Payload::Streaming(body) => collect_body(body).await,
        }
    }
}

/// Hyper `Service` for the checkout API.
///
/// Wraps a [`CheckoutProvider`] and runs every request through routing,
/// signature verification and authentication before dispatching it.
#[derive(Debug)]
pub struct CheckoutHttpService<P: CheckoutProvider> {
    provider: Arc<P>,
    guards: Arc<Guards>,
}

impl<P: CheckoutProvider> CheckoutHttpService<P> {
    /// Create a new `CheckoutHttpService`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVerifier`] when signed requests are
    /// required but no verifier is configured.
    pub fn new(provider: Arc<P>, config: AcpHttpConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            provider,
            guards: Arc::new(Guards::from_config(config)?),
        })
    }
}

impl<P: CheckoutProvider> Clone for CheckoutHttpService<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            guards: Arc::clone(&self.guards),
        }
    }
}

impl<P, B> hyper::service::Service<http::Request<B>> for CheckoutHttpService<P>
where
    P: CheckoutProvider,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Display + Send,
{
    type Response = http::Response<AcpResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let provider = Arc::clone(&self.provider);
        let guards = Arc::clone(&self.guards);

        let ctx = RequestContext::from_headers(req.headers());
        let request_id = request_id(&ctx);
        let span = info_span!("acp_request", request_id = %request_id);

        Box::pin(
            async move {
                let response = process_checkout(req, provider.as_ref(), &guards, &ctx).await;
                Ok(finish(response, &request_id))
            }
            .instrument(span),
        )
    }
}

/// Process a single checkout request through the full pipeline.
async fn process_checkout<P, B>(
    req: http::Request<B>,
    provider: &P,
    guards: &Guards,
    ctx: &RequestContext,
) -> http::Response<AcpResponseBody>
where
    P: CheckoutProvider,
    B: http_body::Body,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();

    // 1. Route by method and path.
    let route = match resolve_checkout(&parts.method, parts.uri.path()) {
        Ok(route) => route,
        Err(err) => return reject(&err, None),
    };

    // 2. Signature and authentication.
    let body = match guards.admit(&route, &parts, body, ctx).await {
        Ok(body) => body,
        Err(err) => return reject(&err, Some(&route)),
    };

    // 3. Decode, validate and dispatch.
    let response = match dispatch_checkout(provider, &route, ctx, &body).await {
        Ok(response) => response,
        Err(err) => return reject(&err, Some(&route)),
    };
    info!(
        operation = %route.operation,
        status = response.status().as_u16(),
        "checkout request handled"
    );
    response
}

/// Hyper `Service` for the delegated payment API.
#[derive(Debug)]
pub struct DelegatedPaymentHttpService<P: DelegatedPaymentProvider> {
    provider: Arc<P>,
    guards: Arc<Guards>,
}

impl<P: DelegatedPaymentProvider> DelegatedPaymentHttpService<P> {
    /// Create a new `DelegatedPaymentHttpService`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVerifier`] when signed requests are
    /// required but no verifier is configured.
    pub fn new(provider: Arc<P>, config: AcpHttpConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            provider,
            guards: Arc::new(Guards::from_config(config)?),
        })
    }
}

impl<P: DelegatedPaymentProvider> Clone for DelegatedPaymentHttpService<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            guards: Arc::clone(&self.guards),
        }
    }
}

impl<P, B> hyper::service::Service<http::Request<B>> for DelegatedPaymentHttpService<P>
where
    P: DelegatedPaymentProvider,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Display + Send,
{
    type Response = http::Response<AcpResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let provider = Arc::clone(&self.provider);
        let guards = Arc::clone(&self.guards);

        let ctx = RequestContext::from_headers(req.headers());
        let request_id = request_id(&ctx);
        let span = info_span!("acp_request", request_id = %request_id);

        Box::pin(
            async move {
                let response =
                    process_delegated_payment(req, provider.as_ref(), &guards, &ctx).await;
                Ok(finish(response, &request_id))
            }
            .instrument(span),
        )
    }
}

/// Process a single delegated payment request through the full pipeline.
async fn process_delegated_payment<P, B>(
    req: http::Request<B>,
    provider: &P,
    guards: &Guards,
    ctx: &RequestContext,
) -> http::Response<AcpResponseBody>
where
    P: DelegatedPaymentProvider,
    B: http_body::Body,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();

    // 1. Route by method and path.
    let route = match resolve_delegated_payment(&parts.method, parts.uri.path()) {
        Ok(route) => route,
        Err(err) => return reject(&err, None),
    };

    // 2. Signature and authentication.
    let body = match guards.admit(&route, &parts, body, ctx).await {
        Ok(body) => body,
        Err(err) => return reject(&err, Some(&route)),
    };

    // 3. Decode, validate and dispatch.
    let response = match dispatch_delegated_payment(provider, ctx, &body).await {
        Ok(response) => response,
        Err(err) => return reject(&err, Some(&route)),
    };
    info!(
        operation = %route.operation,
        status = response.status().as_u16(),
        "delegated payment request handled"
    );
    response
}

fn reject(err: &AcpError, route: Option<&AcpRoute>) -> http::Response<AcpResponseBody> {
    debug!(
        operation = route.map(|r| r.operation.as_str()),
        status = err.status_code.as_u16(),
        code = err.code.as_str(),
        message = %err,
        "request rejected"
    );
    error_to_response(err)
}

/// The client's `Request-Id`, or a fresh one.
fn request_id(ctx: &RequestContext) -> String {
    if ctx.request_id.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        ctx.request_id.clone()
    }
}

fn finish(
    response: http::Response<AcpResponseBody>,
    request_id: &str,
) -> http::Response<AcpResponseBody> {
    let mut response = add_common_headers(response);
    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        response.headers_mut().entry(REQUEST_ID_HEADER).or_insert(hv);
    }
    response
}
