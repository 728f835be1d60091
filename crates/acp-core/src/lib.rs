//! Core types, configuration, and error taxonomy for the Agentic Commerce
//! Protocol.
//!
//! This crate provides the building blocks shared by the signing, model and
//! HTTP crates: the structured [`AcpError`] every client sees, the
//! environment driven [`AcpConfig`], the [`Clock`] abstraction used for
//! timestamp freshness, and the per-request [`RequestContext`].

mod clock;
mod config;
mod error;
mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AcpConfig, DEFAULT_MAX_CLOCK_SKEW, DEFAULT_WEBHOOK_TIMEOUT, WebhookSettings};
pub use error::{AcpError, ConfigError, ErrorCode, ErrorType};
pub use types::{
    API_VERSION, API_VERSION_HEADER, IDEMPOTENCY_KEY_HEADER, REQUEST_ID_HEADER, RequestContext,
    SIGNATURE_HEADER, TIMESTAMP_HEADER, header_str,
};
