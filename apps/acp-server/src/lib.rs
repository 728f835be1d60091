//! Reference Agentic Commerce Protocol merchant server.
//!
//! Hosts the checkout and delegated payment APIs on one listener, backed by
//! an in-memory catalog, session store and payment vault. The binary in
//! `main.rs` reads its configuration from the environment; the pieces are
//! exposed here so tests can run the same gateway in-process.

pub mod gateway;
pub mod server;
pub mod store;
pub mod vault;

pub use gateway::GatewayService;
pub use server::{Gateway, build_gateway, build_http_config, serve};
pub use store::InMemoryCheckout;
pub use vault::InMemoryVault;
