use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response};
use thiserror::Error;

/// Custom error type for HTTP client operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Error when connection to the upstream fails
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error when the upstream does not begin responding within the bound
    #[error("Timeout error after {0} seconds")]
    Timeout(u64),

    /// Error when the outbound request cannot be constructed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for HTTP client operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// HttpClient defines the port (interface) for dispatching requests to
/// upstream services. The forwarding engine depends on this trait rather
/// than a concrete client, so tests can capture outbound requests without
/// touching the network.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send an HTTP request to an upstream service.
    ///
    /// The response body is a stream; implementations must not buffer it.
    async fn send_request(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>>;
}
