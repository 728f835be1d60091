//! End-to-end tests for the ACP reference server.
//!
//! Each test starts its own server on an ephemeral port in-process, so no
//! external setup is needed:
//! ```text
//! cargo test -p acp-integration
//! ```

use std::convert::Infallible;
use std::sync::Once;
use std::time::Duration;

use acp_core::AcpConfig;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A running server bound to `127.0.0.1`. Stops when dropped.
#[derive(Debug)]
pub struct TestServer {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a server with `config`. The `listen` field is ignored.
    pub async fn start(config: AcpConfig) -> Self {
        init_tracing();

        let gateway = acp_server::build_gateway(&config)
            .unwrap_or_else(|e| panic!("failed to build gateway: {e:#}"));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(e) = acp_server::serve(listener, gateway, shutdown).await {
                tracing::error!(error = %e, "test server failed");
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            shutdown: Some(tx),
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// HTTP client used by the tests.
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("build reqwest client")
}

/// `Signature` and `Timestamp` header values for `body` signed at `at`.
#[must_use]
pub fn sign(secret: &[u8], body: &[u8], at: DateTime<Utc>) -> (String, String) {
    let signature = acp_auth::sign_request(secret, &at, body).expect("body should be JSON");
    (signature, acp_auth::format_timestamp(&at))
}

/// Read a response as status plus JSON body.
pub async fn status_and_json(response: reqwest::Response) -> (http::StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.bytes().await.expect("read response body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|e| panic!("response is not JSON ({e}): {bytes:?}"))
    };
    (status, json)
}

/// A webhook delivery captured by [`WebhookReceiver`].
#[derive(Debug)]
pub struct ReceivedWebhook {
    /// Request headers.
    pub headers: http::HeaderMap,
    /// Exact body bytes.
    pub body: Bytes,
}

/// Local endpoint that records every webhook it receives and answers 200.
#[derive(Debug)]
pub struct WebhookReceiver {
    endpoint: String,
    rx: mpsc::UnboundedReceiver<ReceivedWebhook>,
}

impl WebhookReceiver {
    /// Bind to an ephemeral port and start accepting deliveries.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind webhook listener");
        let addr = listener.local_addr().expect("listener address");
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                let svc = service_fn(move |req: http::Request<hyper::body::Incoming>| {
                    let tx = tx.clone();
                    async move {
                        let (parts, body) = req.into_parts();
                        let body = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();
                        let _ = tx.send(ReceivedWebhook {
                            headers: parts.headers,
                            body,
                        });
                        Ok::<_, Infallible>(http::Response::new(Full::new(Bytes::new())))
                    }
                });
                tokio::spawn(async move {
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });

        Self {
            endpoint: format!("http://{addr}/webhooks/acp"),
            rx,
        }
    }

    /// URL to configure as the webhook endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Wait up to five seconds for the next delivery.
    pub async fn next(&mut self) -> ReceivedWebhook {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for webhook")
            .expect("webhook receiver closed")
    }
}

mod test_auth;
mod test_checkout;
mod test_delegated_payment;
mod test_signature;
mod test_webhook;
