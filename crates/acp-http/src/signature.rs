//! Inbound request signature checks.
//!
//! Checks run in a fixed order so that cheap rejections happen before the
//! body is buffered or any MAC is computed:
//!
//! 1. presence of `Signature` and `Timestamp`
//! 2. timestamp format
//! 3. timestamp freshness
//! 4. body is valid JSON
//! 5. cryptographic verification
//!
//! Steps 1-3 only need headers and run in [`SignatureGuard::inspect`]; steps
//! 4-5 need the buffered body and run in [`SignatureGuard::verify`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use acp_auth::canonical::canonicalize_json;
use acp_auth::{SignatureVerifier, SigningMaterial, parse_timestamp};
use acp_core::{AcpError, Clock, ErrorCode, SIGNATURE_HEADER, TIMESTAMP_HEADER, header_str};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Signature headers that passed the header-only checks.
#[derive(Debug, Clone)]
pub struct PendingSignature {
    signature: String,
    timestamp: DateTime<Utc>,
}

/// Enforces request signing for one service.
#[derive(Clone)]
pub struct SignatureGuard {
    verifier: Arc<dyn SignatureVerifier>,
    require_signed: bool,
    max_clock_skew: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SignatureGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureGuard")
            .field("verifier", &"...")
            .field("require_signed", &self.require_signed)
            .field("max_clock_skew", &self.max_clock_skew)
            .field("clock", &self.clock)
            .finish()
    }
}

impl SignatureGuard {
    /// Create a guard. A zero `max_clock_skew` disables the freshness check.
    pub fn new(
        verifier: Arc<dyn SignatureVerifier>,
        require_signed: bool,
        max_clock_skew: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            require_signed,
            max_clock_skew,
            clock,
        }
    }

    /// Run the header-only checks.
    ///
    /// Returns `None` for an unsigned request that is allowed through.
    pub fn inspect(&self, headers: &http::HeaderMap) -> Result<Option<PendingSignature>, AcpError> {
        let signature = header_str(headers, SIGNATURE_HEADER);
        let timestamp = header_str(headers, TIMESTAMP_HEADER);

        match (signature.is_empty(), timestamp.is_empty()) {
            (true, true) => {
                if self.require_signed {
                    return Err(AcpError::invalid_request(
                        ErrorCode::SignatureRequired,
                        "Signature and Timestamp headers are required",
                    )
                    .with_status(http::StatusCode::UNAUTHORIZED));
                }
                return Ok(None);
            }
            (false, false) => {}
            _ => {
                return Err(AcpError::invalid_request(
                    ErrorCode::InvalidSignature,
                    "Signature and Timestamp headers must both be provided",
                ));
            }
        }

        let timestamp = parse_timestamp(&timestamp).map_err(|_| {
            AcpError::invalid_request(ErrorCode::InvalidSignature, "Timestamp must be RFC3339")
        })?;

        if !self.max_clock_skew.is_zero() {
            let delta = self.clock.now().signed_duration_since(timestamp);
            let skew = if delta < chrono::TimeDelta::zero() { -delta } else { delta };
            if skew.to_std().is_ok_and(|s| s > self.max_clock_skew) {
                debug!(skew_ms = skew.num_milliseconds(), "rejecting stale timestamp");
                return Err(AcpError::invalid_request(
                    ErrorCode::StaleTimestamp,
                    format!(
                        "timestamp skew exceeds {}s",
                        self.max_clock_skew.as_secs()
                    ),
                )
                .with_status(http::StatusCode::UNAUTHORIZED));
            }
        }

        Ok(Some(PendingSignature {
            signature,
            timestamp,
        }))
    }

    /// Canonicalize the buffered body and verify the signature over it.
    pub fn verify(
        &self,
        pending: PendingSignature,
        parts: &http::request::Parts,
        body: &[u8],
    ) -> Result<(), AcpError> {
        let canonical_body = canonicalize_json(body).map_err(|e| {
            debug!(error = %e, "signed body is not valid JSON");
            AcpError::invalid_request(ErrorCode::InvalidRequest, "request body must be valid JSON")
        })?;

        let material = SigningMaterial {
            signature: pending.signature,
            timestamp: pending.timestamp,
            canonical_body,
            method: parts.method.clone(),
            path: parts.uri.path().to_owned(),
            raw_query: parts.uri.query().unwrap_or_default().to_owned(),
            headers: parts.headers.clone(),
        };

        self.verifier.verify(&material).map_err(|e| {
            warn!(
                error = %e,
                method = %material.method,
                path = %material.path,
                "signature verification failed"
            );
            AcpError::invalid_request(ErrorCode::InvalidSignature, "signature verification failed")
                .with_status(http::StatusCode::UNAUTHORIZED)
        })
    }
}
