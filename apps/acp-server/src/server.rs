//! Gateway assembly and the accept loop.

use std::future::Future;
use std::sync::Arc;

use acp_auth::{Authenticator, HmacVerifier, SignatureVerifier, StaticApiKeyAuthenticator};
use acp_core::{AcpConfig, Clock, SystemClock};
use acp_http::{
    AcpHttpConfig, CheckoutHttpService, DelegatedPaymentHttpService, WebhookConfig, WebhookSender,
};
use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::gateway::GatewayService;
use crate::store::InMemoryCheckout;
use crate::vault::InMemoryVault;

/// The gateway served by this binary.
pub type Gateway = GatewayService<InMemoryCheckout, InMemoryVault>;

/// Build the [`AcpHttpConfig`] from the application [`AcpConfig`].
///
/// # Errors
///
/// Returns an error if the signing secret is rejected by the verifier.
pub fn build_http_config(config: &AcpConfig, clock: Arc<dyn Clock>) -> Result<AcpHttpConfig> {
    let signature_verifier = config
        .signing_secret
        .as_ref()
        .map(|secret| HmacVerifier::new(secret.as_bytes().to_vec()))
        .transpose()
        .context("invalid ACP_SIGNING_SECRET")?
        .map(|v| Arc::new(v) as Arc<dyn SignatureVerifier>);

    let authenticator = (!config.api_keys.is_empty()).then(|| {
        Arc::new(StaticApiKeyAuthenticator::new(config.api_keys.iter().cloned()))
            as Arc<dyn Authenticator>
    });

    Ok(AcpHttpConfig {
        signature_verifier,
        require_signed_requests: config.require_signed_requests,
        max_clock_skew: config.max_clock_skew,
        authenticator,
        clock,
    })
}

/// Build the gateway with in-memory providers.
///
/// # Errors
///
/// Returns an error if the configuration is inconsistent or the webhook
/// sender cannot be created.
pub fn build_gateway(config: &AcpConfig) -> Result<Gateway> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let http_config = build_http_config(config, Arc::clone(&clock))?;

    let webhook = config
        .webhook
        .clone()
        .map(|settings| WebhookSender::new(WebhookConfig::from(settings)))
        .transpose()
        .context("invalid webhook configuration")?;
    match &webhook {
        Some(sender) => info!(endpoint = sender.endpoint(), "webhooks enabled"),
        None => info!("webhooks disabled"),
    }

    let checkout = CheckoutHttpService::new(
        Arc::new(InMemoryCheckout::new(Arc::clone(&clock), webhook)),
        http_config.clone(),
    )?;
    let delegated_payment =
        DelegatedPaymentHttpService::new(Arc::new(InMemoryVault::new(clock)), http_config)?;

    Ok(GatewayService::new(checkout, delegated_payment))
}

/// Run the accept loop until `shutdown` resolves, then drain connections.
///
/// # Errors
///
/// Currently infallible once the listener is bound.
pub async fn serve<F>(listener: TcpListener, service: Gateway, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained");

    Ok(())
}
