use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response, Version, header, header::HeaderValue};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::timeout;

use crate::{
    ports::http_client::{HttpClient, HttpClientError, HttpClientResult},
    tracing_setup::create_upstream_span,
};

/// HTTP client adapter using Hyper with Rustls (HTTP/1.1 + HTTP/2).
///
/// Responsibilities:
/// * Sets the Host header from the upstream authority
/// * Forces request version to HTTP/1.1 while allowing ALPN to negotiate h2
/// * Bounds the wait for the upstream to begin responding
/// * Converts between Hyper body and Axum body types, streaming both ways
///
/// This adapter is intentionally minimal; it performs no retries. Retry
/// policy, if any, belongs to a layer above the gateway.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
    response_timeout: Duration,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter with the given response timeout.
    pub fn new(response_timeout: Duration) -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::info!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        tracing::info!(
            response_timeout_secs = response_timeout.as_secs(),
            "Created upstream HTTP client"
        );
        Ok(Self {
            client,
            response_timeout,
        })
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        let client = self.client.clone();

        let upstream_identifier = format!(
            "{}://{}",
            req.uri().scheme_str().unwrap_or("http"),
            req.uri()
                .authority()
                .map_or_else(|| "unknown".to_string(), |a| a.to_string())
        );
        let request_path = req.uri().path().to_string();
        let request_method = req.method().to_string();

        let span = create_upstream_span(&upstream_identifier, &request_method, &request_path);
        let _enter = span.enter();

        // Set Host header from the upstream authority
        if let Some(host_str) = req.uri().host() {
            let host_header_val = if let Some(port) = req.uri().port() {
                HeaderValue::from_str(&format!("{host_str}:{}", port.as_u16()))
                    .unwrap_or_else(|_| HeaderValue::from_static(""))
            } else {
                HeaderValue::from_str(host_str).unwrap_or_else(|_| HeaderValue::from_static(""))
            };
            if !host_header_val.is_empty() {
                req.headers_mut()
                    .insert(hyper::header::HOST, host_header_val);
            }
        } else {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        }

        let (mut parts, axum_body) = req.into_parts();
        parts.version = Version::HTTP_11;

        tracing::debug!("Outgoing request headers: {:?}", parts.headers);

        // Use the streaming body directly
        let outgoing_request = Request::from_parts(parts, axum_body);

        let method_for_error_log = outgoing_request.method().clone();
        let uri_for_error_log = outgoing_request.uri().clone();

        // Bound the wait for the upstream to begin responding. Body
        // streaming after first byte is not subject to this bound.
        match timeout(self.response_timeout, client.request(outgoing_request)).await {
            Ok(Ok(response)) => {
                let status_code = response.status().as_u16();
                tracing::Span::current().record("http.status_code", status_code);

                let (mut parts, hyper_body) = response.into_parts();

                // Remove Transfer-Encoding since the body is being
                // decoded/streamed and the downstream server (Axum) will
                // handle framing.
                parts.headers.remove(header::TRANSFER_ENCODING);

                let axum_body = AxumBody::new(hyper_body);

                Ok(Response::from_parts(parts, axum_body))
            }
            Ok(Err(e)) => {
                tracing::Span::current().record("http.status_code", 599u16);
                tracing::error!(
                    "Error making request to upstream {} ({} {}): {}",
                    upstream_identifier,
                    method_for_error_log,
                    uri_for_error_log,
                    e
                );

                Err(HttpClientError::ConnectionError(format!(
                    "Request to {method_for_error_log} {uri_for_error_log} failed: {e}"
                )))
            }
            Err(_) => {
                tracing::Span::current().record("http.status_code", 599u16);
                tracing::warn!(
                    "Upstream {} did not respond within {:?} ({} {})",
                    upstream_identifier,
                    self.response_timeout,
                    method_for_error_log,
                    uri_for_error_log,
                );

                Err(HttpClientError::Timeout(self.response_timeout.as_secs()))
            }
        }
    }
}
