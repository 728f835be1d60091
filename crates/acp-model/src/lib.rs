//! Agentic Commerce Protocol model types.
//!
//! Hand-written serde types for the checkout, delegated payment and webhook
//! payloads, together with the field validation the HTTP layer runs after
//! decoding. All fields use the snake_case wire names of the protocol.
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

pub mod checkout;
pub mod delegated_payment;
pub mod operations;
pub mod validation;
pub mod webhook;

pub use operations::AcpOperation;
pub use validation::{Validate, ValidationError};
