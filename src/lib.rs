//! Projects Gateway - an authenticating reverse proxy.
//!
//! The gateway is the single network-facing process in front of a set of
//! backend services. For every inbound request it decides whether a bearer
//! token is required, verifies the token against a shared secret, resolves
//! the request path to exactly one upstream via longest-prefix matching,
//! and relays the upstream response back to the caller as a stream. Verified
//! identity is injected downstream as trusted `x-user-id` / `x-user-role`
//! headers that callers can never spoof.
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping business logic inside `core`:
//! * `core` - token verification, access policy, route table, header policy.
//!   Pure in-memory logic, no I/O, unit-testable in isolation.
//! * `ports` - the `HttpClient` trait the forwarding engine depends on.
//! * `adapters` - the Hyper/Rustls client and the Axum request handler that
//!   sequences the request lifecycle.
//!
//! # Error Handling
//! Domain errors are `thiserror` enums (`VerificationError`, `RouteError`,
//! `HttpClientError`); application-level fallible APIs return `eyre::Result`
//! with context attached via `WrapErr`. Request-scoped errors are converted
//! to exactly one terminal response (401 / 404 / 502 / 504) and never
//! propagate past the handler.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use projects_gateway::{GatewayService, config::GatewayConfig};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let cfg: GatewayConfig = projects_gateway::config::loader::load_config("config.toml").await?;
//! let gateway = Arc::new(GatewayService::new(Arc::new(cfg)));
//! // Wire this into the provided HttpHandler adapter (see binary crate)
//! # Ok(()) }
//! ```
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

// These modules are implementation details and should not be directly used by users
pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{HttpClientAdapter, HttpHandler},
    core::GatewayService,
    ports::http_client::HttpClient,
    utils::GracefulShutdown,
};
