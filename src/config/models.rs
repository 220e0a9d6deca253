//! Configuration data structures for the gateway.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files. They are
//! intentionally serde-friendly and include defaults so that minimal configs remain concise.
//! The builder is considered part of the public API for embedding and for tests.
use serde::{Deserialize, Serialize};

fn default_response_timeout_secs() -> u64 {
    30
}

/// Root configuration constructed once at process start and shared immutably
/// for the process lifetime. No component reads ambient/global state at
/// request time; everything flows from this struct.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Address the gateway listens on, e.g. "0.0.0.0:8080".
    pub listen_addr: String,
    /// Token verification and exemption settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Ordered route bindings. Registration order is the documented tie-break
    /// when two public prefixes have equal length.
    #[serde(default)]
    pub routes: Vec<RouteBindingConfig>,
    /// Outbound forwarding settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl GatewayConfig {
    /// Create a new gateway configuration builder
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            auth: AuthConfig::default(),
            routes: Vec::new(),
            upstream: UpstreamConfig::default(),
        }
    }
}

/// Bearer-token verification settings.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret the token issuer signs with. Must be at least 32
    /// bytes; startup validation refuses anything weaker.
    pub secret: String,
    /// Path prefixes exempt from authentication. Sub-paths of an exempt
    /// prefix are also exempt.
    pub exempt_prefixes: Vec<String>,
}

/// One (public prefix, upstream, internal prefix) binding.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouteBindingConfig {
    /// Leading path segment matched against inbound request paths. Unique
    /// across the table.
    pub public_prefix: String,
    /// Base URL of the backend service, e.g. "http://projects-service:8080".
    pub upstream: String,
    /// Replacement for the matched public prefix. Empty string strips the
    /// prefix entirely.
    #[serde(default)]
    pub internal_prefix: String,
}

/// Outbound forwarding settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Maximum time to wait for an upstream to begin responding, in seconds.
    /// Exceeding it yields a 504 to the caller.
    pub response_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout_secs(),
        }
    }
}

/// Builder for GatewayConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct GatewayConfigBuilder {
    listen_addr: Option<String>,
    secret: Option<String>,
    exempt_prefixes: Vec<String>,
    routes: Vec<RouteBindingConfig>,
    response_timeout_secs: Option<u64>,
}

impl GatewayConfigBuilder {
    /// Set the listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the shared verification secret
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Add a path prefix exempt from authentication
    pub fn exempt_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exempt_prefixes.push(prefix.into());
        self
    }

    /// Add a route binding. Registration order is preserved and acts as the
    /// tie-break for equal-length prefixes.
    pub fn route(
        mut self,
        public_prefix: impl Into<String>,
        upstream: impl Into<String>,
        internal_prefix: impl Into<String>,
    ) -> Self {
        self.routes.push(RouteBindingConfig {
            public_prefix: public_prefix.into(),
            upstream: upstream.into(),
            internal_prefix: internal_prefix.into(),
        });
        self
    }

    /// Set the upstream response timeout in seconds
    pub fn response_timeout_secs(mut self, secs: u64) -> Self {
        self.response_timeout_secs = Some(secs);
        self
    }

    /// Build the final GatewayConfig
    pub fn build(self) -> Result<GatewayConfig, String> {
        let listen_addr = self
            .listen_addr
            .ok_or_else(|| "listen_addr is required".to_string())?;

        if self.routes.is_empty() {
            return Err("At least one route must be configured".to_string());
        }

        Ok(GatewayConfig {
            listen_addr,
            auth: AuthConfig {
                secret: self.secret.unwrap_or_default(),
                exempt_prefixes: self.exempt_prefixes,
            },
            routes: self.routes,
            upstream: UpstreamConfig {
                response_timeout_secs: self
                    .response_timeout_secs
                    .unwrap_or_else(default_response_timeout_secs),
            },
        })
    }
}
