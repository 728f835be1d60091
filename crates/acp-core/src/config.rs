//! Configuration management for ACP merchant servers.
//!
//! All configuration is driven by environment variables.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Default skew window for signed request timestamps.
pub const DEFAULT_MAX_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Default timeout for a single webhook delivery.
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound webhook delivery settings.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSettings {
    /// Absolute URL receiving events.
    pub endpoint: String,
    /// Name of the header carrying the HMAC signature.
    pub header_name: String,
    /// Shared HMAC secret.
    pub secret: String,
    /// Per-delivery timeout.
    pub timeout: Duration,
}

impl fmt::Debug for WebhookSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSettings")
            .field("endpoint", &self.endpoint)
            .field("header_name", &self.header_name)
            .field("secret", &"[redacted]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Global configuration for an ACP merchant server.
#[derive(Clone, PartialEq, Eq)]
pub struct AcpConfig {
    /// Bind address for the gateway.
    pub listen: String,
    /// Log level.
    pub log_level: String,
    /// Shared secret for inbound request signatures. `None` disables
    /// signature verification.
    pub signing_secret: Option<String>,
    /// Reject requests that carry no signature.
    pub require_signed_requests: bool,
    /// Maximum tolerated timestamp skew. Zero disables the check.
    pub max_clock_skew: Duration,
    /// Accepted bearer API keys. Empty disables authentication.
    pub api_keys: Vec<String>,
    /// Outbound webhook settings, if configured.
    pub webhook: Option<WebhookSettings>,
}

impl fmt::Debug for AcpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcpConfig")
            .field("listen", &self.listen)
            .field("log_level", &self.log_level)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "[redacted]"))
            .field("require_signed_requests", &self.require_signed_requests)
            .field("max_clock_skew", &self.max_clock_skew)
            .field("api_keys", &self.api_keys.len())
            .field("webhook", &self.webhook)
            .finish()
    }
}

impl Default for AcpConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_owned(),
            log_level: "info".to_owned(),
            signing_secret: None,
            require_signed_requests: false,
            max_clock_skew: DEFAULT_MAX_CLOCK_SKEW,
            api_keys: Vec::new(),
            webhook: None,
        }
    }
}

impl AcpConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("ACP_LISTEN") {
            config.listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("ACP_SIGNING_SECRET").filter(|v| !v.is_empty()) {
            config.signing_secret = Some(v);
        }
        if let Some(v) = lookup("ACP_REQUIRE_SIGNED_REQUESTS") {
            config.require_signed_requests = parse_bool("ACP_REQUIRE_SIGNED_REQUESTS", &v)?;
        }
        if let Some(v) = lookup("ACP_MAX_CLOCK_SKEW_SECS") {
            config.max_clock_skew = parse_secs("ACP_MAX_CLOCK_SKEW_SECS", &v)?;
        }
        if let Some(v) = lookup("ACP_API_KEYS") {
            config.api_keys = v
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned)
                .collect();
        }

        let endpoint = lookup("ACP_WEBHOOK_ENDPOINT");
        let header_name = lookup("ACP_WEBHOOK_HEADER");
        let secret = lookup("ACP_WEBHOOK_SECRET");
        config.webhook = match (endpoint, header_name, secret) {
            (None, None, None) => None,
            (Some(endpoint), Some(header_name), Some(secret)) => {
                let timeout = match lookup("ACP_WEBHOOK_TIMEOUT_SECS") {
                    Some(v) => parse_secs("ACP_WEBHOOK_TIMEOUT_SECS", &v)?,
                    None => DEFAULT_WEBHOOK_TIMEOUT,
                };
                Some(WebhookSettings {
                    endpoint: non_empty("ACP_WEBHOOK_ENDPOINT", endpoint)?,
                    header_name: non_empty("ACP_WEBHOOK_HEADER", header_name)?,
                    secret: non_empty("ACP_WEBHOOK_SECRET", secret)?,
                    timeout,
                })
            }
            _ => return Err(ConfigError::IncompleteWebhook),
        };

        if config.require_signed_requests && config.signing_secret.is_none() {
            return Err(ConfigError::MissingVerifier);
        }

        Ok(config)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" => Ok(true),
        "0" | "" => Ok(false),
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_owned(),
        }),
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidValue {
            name,
            value: value.to_owned(),
        })
}

fn non_empty(name: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(trimmed.to_owned())
}
