//! Request signing and authentication for the Agentic Commerce Protocol.
//!
//! # Overview
//!
//! ACP clients sign each request with a shared secret:
//!
//! ```text
//! Signature = base64url(HMAC-SHA256(secret, RFC3339Nano(UTC(ts)) + "." + canonical_json(body)))
//! ```
//!
//! and send it in the `Signature` header together with the `Timestamp`
//! header. This crate provides the canonical JSON serializer, the payload
//! builder, a reference [`HmacVerifier`], the bearer key [`Authenticator`]
//! abstraction, and the primitive used to sign outbound webhooks.
//!
//! # Usage
//!
//! ```rust
//! use acp_auth::{HmacVerifier, SignatureVerifier, SigningMaterial};
//! use acp_auth::canonical::canonicalize_json;
//! use acp_auth::signing::sign_request;
//! use chrono::Utc;
//!
//! let ts = Utc::now();
//! let body = br#"{"items":[{"id":"latte","quantity":1}]}"#;
//! let signature = sign_request(b"secret", &ts, body).unwrap();
//!
//! let verifier = HmacVerifier::new(b"secret".to_vec()).unwrap();
//! let material = SigningMaterial {
//!     signature,
//!     timestamp: ts,
//!     canonical_body: canonicalize_json(body).unwrap(),
//!     method: http::Method::POST,
//!     path: "/checkout_sessions".to_owned(),
//!     raw_query: String::new(),
//!     headers: http::HeaderMap::new(),
//! };
//! assert!(verifier.verify(&material).is_ok());
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical JSON serialization
//! - [`signing`] - Timestamp formatting, payload construction and HMAC
//! - [`verifier`] - Verifier trait and HMAC reference implementation
//! - [`authenticator`] - Bearer API key authentication
//! - [`error`] - Error types

pub mod authenticator;
pub mod canonical;
pub mod error;
pub mod signing;
pub mod verifier;

pub use authenticator::{Authenticator, StaticApiKeyAuthenticator};
pub use error::{AuthenticationError, CanonicalizationError, SignatureError};
pub use signing::{
    build_signing_payload, format_timestamp, parse_timestamp, sign_request, sign_webhook_payload,
};
pub use verifier::{HmacVerifier, SignatureVerifier, SigningMaterial};
