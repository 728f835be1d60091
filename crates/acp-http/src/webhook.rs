//! Outbound webhook delivery.
//!
//! Events are serialized once and the signature covers those exact bytes:
//!
//! ```text
//! <header_name>: base64url(HMAC-SHA256(secret, body))
//! ```
//!
//! Each call makes a single delivery attempt. Retrying is up to the caller.

use std::fmt;
use std::time::Duration;

use acp_auth::sign_webhook_payload;
use acp_core::{API_VERSION, API_VERSION_HEADER, DEFAULT_WEBHOOK_TIMEOUT, WebhookSettings};
use acp_model::webhook::WebhookEvent;
use tracing::{debug, warn};

use crate::response::CONTENT_TYPE;

/// Largest response body excerpt kept in [`WebhookError::UnexpectedStatus`].
pub const MAX_ERROR_SNIPPET: usize = 4096;

/// Settings for a [`WebhookSender`].
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Absolute `http` or `https` URL receiving events.
    pub endpoint: String,
    /// Header carrying the signature, e.g. `Merchant-Signature`.
    pub header_name: String,
    /// HMAC secret shared with the receiver.
    pub secret: Vec<u8>,
    /// Per-delivery timeout.
    pub timeout: Duration,
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("endpoint", &self.endpoint)
            .field("header_name", &self.header_name)
            .field("secret", &"[redacted]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl From<WebhookSettings> for WebhookConfig {
    fn from(settings: WebhookSettings) -> Self {
        Self {
            endpoint: settings.endpoint,
            header_name: settings.header_name,
            secret: settings.secret.into_bytes(),
            timeout: settings.timeout,
        }
    }
}

/// Errors from configuring or delivering webhooks.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// A required setting is empty.
    #[error("webhook {0} is required")]
    InvalidConfig(&'static str),

    /// The endpoint is not an absolute http(s) URL.
    #[error("invalid webhook endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as configured.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The signature header name is not a valid HTTP header name.
    #[error("invalid webhook header name {0:?}")]
    InvalidHeaderName(String),

    /// The event could not be serialized.
    #[error("failed to serialize webhook event: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The request failed before a response arrived.
    #[error("webhook delivery failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The receiver answered with a non-2xx status.
    #[error("webhook endpoint {endpoint} returned {status}: {body}")]
    UnexpectedStatus {
        /// Endpoint the event was sent to.
        endpoint: String,
        /// Response status.
        status: http::StatusCode,
        /// Trimmed excerpt of the response body.
        body: String,
    },
}

/// Signs and delivers webhook events to a single endpoint.
#[derive(Clone)]
pub struct WebhookSender {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    header_name: http::HeaderName,
    secret: Vec<u8>,
    timeout: Duration,
}

impl fmt::Debug for WebhookSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSender")
            .field("endpoint", &self.endpoint.as_str())
            .field("header_name", &self.header_name)
            .field("secret", &"[redacted]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WebhookSender {
    /// Create a sender with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the client
    /// cannot be built.
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().build()?;
        Self::with_client(config, client)
    }

    /// Create a sender that shares an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint, header name or secret is empty or
    /// invalid.
    pub fn with_client(
        config: WebhookConfig,
        client: reqwest::Client,
    ) -> Result<Self, WebhookError> {
        let endpoint = config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(WebhookError::InvalidConfig("endpoint"));
        }
        let header_name = config.header_name.trim();
        if header_name.is_empty() {
            return Err(WebhookError::InvalidConfig("header name"));
        }
        if config.secret.is_empty() {
            return Err(WebhookError::InvalidConfig("secret"));
        }

        let url = reqwest::Url::parse(endpoint).map_err(|e| WebhookError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(WebhookError::InvalidEndpoint {
                endpoint: endpoint.to_owned(),
                reason: "must be an absolute http or https URL".to_owned(),
            });
        }
        let header_name = http::HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|_| WebhookError::InvalidHeaderName(header_name.to_owned()))?;

        let timeout = if config.timeout.is_zero() {
            DEFAULT_WEBHOOK_TIMEOUT
        } else {
            config.timeout
        };

        Ok(Self {
            client,
            endpoint: url,
            header_name,
            secret: config.secret,
            timeout,
        })
    }

    /// The validated endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Sign and POST `event`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any non-2xx response.
    pub async fn send(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let body = serde_json::to_vec(event)?;
        let signature = sign_webhook_payload(&self.secret, &body);

        debug!(
            endpoint = %self.endpoint,
            event_type = event.event_type(),
            checkout_session_id = %event.data().checkout_session_id,
            "sending webhook"
        );

        let mut response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
            .header(API_VERSION_HEADER, API_VERSION)
            .header(self.header_name.clone(), signature)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut snippet = Vec::new();
        while snippet.len() < MAX_ERROR_SNIPPET {
            match response.chunk().await {
                Ok(Some(chunk)) => snippet.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "failed to read webhook error body");
                    break;
                }
            }
        }
        snippet.truncate(MAX_ERROR_SNIPPET);
        let body = String::from_utf8_lossy(&snippet).trim().to_owned();

        warn!(endpoint = %self.endpoint, status = status.as_u16(), "webhook rejected");
        Err(WebhookError::UnexpectedStatus {
            endpoint: self.endpoint.to_string(),
            status,
            body,
        })
    }
}
