//! Core gateway orchestration service.
//!
//! The `GatewayService` aggregates the immutable `GatewayConfig` with the
//! structures derived from it at startup:
//! * Longest-prefix route lookup with path rewriting
//! * Per-path authentication exemption checks
//! * Bearer-token verification
//!
//! This layer deliberately avoids I/O and only manipulates in-memory data so
//! it remains fast and easily testable in isolation. The request lifecycle
//! sequencing lives in the `HttpHandler` adapter.
use std::{sync::Arc, time::Duration};

use axum::http::{HeaderMap, header};

use crate::{
    config::GatewayConfig,
    core::{
        access_policy::AccessPolicy,
        auth::{IdentityClaims, TokenVerifier, VerificationError, extract_bearer},
        route_table::{ResolvedRoute, RouteError, RouteTable},
    },
};

/// Central orchestrator for access policy, token verification and route
/// resolution. Construct with [`GatewayService::new`] by passing an
/// `Arc<GatewayConfig>`; the route table is sorted and the verifier's key
/// derived eagerly so lookups stay fast in the hot path.
pub struct GatewayService {
    config: Arc<GatewayConfig>,
    route_table: RouteTable,
    access_policy: AccessPolicy,
    verifier: TokenVerifier,
}

impl GatewayService {
    pub fn new(config: Arc<GatewayConfig>) -> Self {
        let route_table = RouteTable::new(&config.routes);
        let access_policy = AccessPolicy::new(&config.auth.exempt_prefixes);
        let verifier = TokenVerifier::new(&config.auth.secret);

        Self {
            config,
            route_table,
            access_policy,
            verifier,
        }
    }

    /// Whether the given path requires a verified identity before forwarding.
    pub fn requires_auth(&self, path: &str) -> bool {
        self.access_policy.requires_auth(path)
    }

    /// Extract and verify the bearer credential from inbound headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<IdentityClaims, VerificationError> {
        let header_value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(VerificationError::MalformedCredential)?;

        let token = extract_bearer(header_value)?;
        self.verifier.verify(token)
    }

    /// Resolve a request path (with query string) to an upstream target.
    pub fn resolve(&self, path_and_query: &str) -> Result<ResolvedRoute, RouteError> {
        self.route_table.resolve(path_and_query)
    }

    /// Upper bound on the time spent waiting for an upstream to begin
    /// responding.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.config.upstream.response_timeout_secs)
    }

    /// Number of configured route bindings.
    pub fn route_count(&self) -> usize {
        self.route_table.len()
    }
}
