use std::sync::Arc;

use axum::{
    body::Body as AxumBody,
    http::{StatusCode, header},
};
use eyre::{Result, WrapErr};
use hyper::{Request, Response};

use crate::{
    core::{
        GatewayService,
        headers::{ForwardedContext, build_outbound_headers},
    },
    metrics,
    ports::http_client::{HttpClient, HttpClientError},
    tracing_setup::create_request_span,
};

/// HTTP handler driving the request lifecycle: access-policy check,
/// credential verification, route resolution and streaming forwarding.
///
/// Outcome mapping:
/// * failed verification on a protected path -> 401 (generic body)
/// * no matching route -> 404
/// * upstream connection failure -> 502
/// * upstream response timeout -> 504
/// * otherwise the upstream response is relayed verbatim
pub struct HttpHandler {
    gateway_service: Arc<GatewayService>,
    http_client: Arc<dyn HttpClient>,
}

impl HttpHandler {
    pub fn new(gateway_service: Arc<GatewayService>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            gateway_service,
            http_client,
        }
    }

    /// Main request handler. Never calls the upstream before both the
    /// access-policy check and route resolution have passed.
    pub async fn handle_request(
        &self,
        req: Request<AxumBody>,
    ) -> Result<Response<AxumBody>, eyre::Error> {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let path = uri.path().to_string();
        let path_and_query = uri
            .path_and_query()
            .map_or_else(|| path.clone(), |pq| pq.as_str().to_string());

        let span = create_request_span(method.as_str(), &path);
        let _enter = span.enter();
        let _timer = metrics::RequestTimer::new(&path, method.as_str());

        tracing::debug!("Handling {} request to {}", method, path);

        // Verify the caller's identity unless the path is exempt. The
        // response body is identical for every rejection reason; logs and
        // metrics carry the distinction.
        let claims = if self.gateway_service.requires_auth(&path) {
            match self.gateway_service.authenticate(req.headers()) {
                Ok(claims) => Some(claims),
                Err(e) => {
                    tracing::warn!(reason = e.reason(), path = %path, "Rejected credential: {}", e);
                    metrics::increment_auth_failure(e.reason());
                    let response = error_response(StatusCode::UNAUTHORIZED, "unauthorized")?;
                    metrics::increment_request_total(&path, method.as_str(), 401);
                    return Ok(response);
                }
            }
        } else {
            None
        };

        // Resolve the upstream target before touching the request body.
        let route = match self.gateway_service.resolve(&path_and_query) {
            Ok(route) => route,
            Err(e) => {
                tracing::info!(path = %path, "Route resolution failed: {}", e);
                let response = error_response(StatusCode::NOT_FOUND, "not found")?;
                metrics::increment_request_total(&path, method.as_str(), 404);
                return Ok(response);
            }
        };

        let forwarded = ForwardedContext::from_inbound(req.headers());
        let outbound_headers = build_outbound_headers(req.headers(), claims.as_ref(), &forwarded);

        let upstream_uri = format!("{}{}", route.upstream, route.rewritten_path);

        // Rebuild the request around the streaming body; nothing here buffers.
        let (parts, body) = req.into_parts();
        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(&upstream_uri)
            .body(body)
            .wrap_err_with(|| format!("Failed to build upstream request for {upstream_uri}"))?;
        *outbound.headers_mut() = outbound_headers;

        let upstream_timer = metrics::UpstreamRequestTimer::new(&route.upstream, method.as_str());

        match self.http_client.send_request(outbound).await {
            Ok(response) => {
                drop(upstream_timer);
                let status = response.status().as_u16();
                metrics::increment_upstream_request_total(&route.upstream, method.as_str(), status);
                metrics::increment_request_total(&path, method.as_str(), status);
                Ok(response)
            }
            Err(HttpClientError::Timeout(secs)) => {
                drop(upstream_timer);
                tracing::error!(
                    upstream = %route.upstream,
                    "Upstream did not respond within {} seconds",
                    secs
                );
                metrics::increment_upstream_request_total(&route.upstream, method.as_str(), 504);
                metrics::increment_request_total(&path, method.as_str(), 504);
                error_response(StatusCode::GATEWAY_TIMEOUT, "upstream timeout")
            }
            Err(e) => {
                drop(upstream_timer);
                tracing::error!(upstream = %route.upstream, "Upstream request failed: {}", e);
                metrics::increment_upstream_request_total(&route.upstream, method.as_str(), 502);
                metrics::increment_request_total(&path, method.as_str(), 502);
                error_response(StatusCode::BAD_GATEWAY, "upstream unavailable")
            }
        }
    }
}

/// Build a small JSON error body. Upstream-relayed responses never pass
/// through here; only gateway-originated outcomes do.
fn error_response(status: StatusCode, message: &str) -> Result<Response<AxumBody>, eyre::Error> {
    let body = serde_json::json!({ "error": message });

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(AxumBody::from(body.to_string()))
        .wrap_err("Failed to build error response")
}

impl Clone for HttpHandler {
    fn clone(&self) -> Self {
        Self {
            gateway_service: self.gateway_service.clone(),
            http_client: self.http_client.clone(),
        }
    }
}
