//! ACP Server - reference merchant for the Agentic Commerce Protocol.
//!
//! # Usage
//!
//! ```text
//! ACP_LISTEN=0.0.0.0:8080 ACP_SIGNING_SECRET=s3cret acp-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ACP_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `ACP_SIGNING_SECRET` | *(unset)* | HMAC secret for inbound request signatures |
//! | `ACP_REQUIRE_SIGNED_REQUESTS` | `false` | Reject requests without `Signature`/`Timestamp` |
//! | `ACP_MAX_CLOCK_SKEW_SECS` | `300` | Allowed distance between `Timestamp` and now |
//! | `ACP_API_KEYS` | *(empty = no auth)* | Comma-separated bearer API keys |
//! | `ACP_WEBHOOK_ENDPOINT` | *(unset)* | URL receiving order webhooks |
//! | `ACP_WEBHOOK_HEADER` | *(unset)* | Header carrying the webhook signature |
//! | `ACP_WEBHOOK_SECRET` | *(unset)* | HMAC secret for webhook payloads |
//! | `ACP_WEBHOOK_TIMEOUT_SECS` | `10` | Per-delivery timeout |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;

use acp_core::AcpConfig;
use acp_server::{build_gateway, serve};
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported in logs.
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Probe `/health` on a running server, for container health checks.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"ok\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c, shutting down");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AcpConfig::from_env().context("invalid configuration")?;

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    let gateway = build_gateway(&config)?;

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        signed_requests = config.signing_secret.is_some(),
        require_signed_requests = config.require_signed_requests,
        api_keys = config.api_keys.len(),
        version = VERSION,
        "starting ACP server",
    );

    serve(listener, gateway, shutdown_signal()).await
}
